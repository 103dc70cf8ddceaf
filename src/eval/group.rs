//! Grouping constructs — chords and voices.
//!
//! Both fork the offset cursor from a shared start and then resynchronize:
//! a chord resumes after its shortest advancing member, a voice group after
//! its longest voice. All other state (tempo, volume, ...) is shared, so a
//! later member sees attribute changes made by an earlier one.

use log::warn;

use crate::error::Result;
use crate::event::{Beat, Chord, Event};

use super::instruction::{Instruction, VoiceSpec};
use super::Evaluator;

/// Events produced by a voice group, kept per voice in evaluation order.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceGroup {
    pub start: Beat,
    pub end: Beat,
    voices: Vec<(u32, Vec<Event>)>,
}

impl VoiceGroup {
    /// Events of one voice.
    pub fn voice(&self, id: u32) -> Option<&[Event]> {
        self.voices
            .iter()
            .find(|(v, _)| *v == id)
            .map(|(_, events)| events.as_slice())
    }

    /// Voice identifiers in evaluation order.
    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.voices.iter().map(|(id, _)| *id)
    }

    /// All events, voice after voice, as they land on the instrument timeline.
    pub fn into_events(self) -> Vec<Event> {
        self.voices
            .into_iter()
            .flat_map(|(_, events)| events)
            .collect()
    }
}

impl Evaluator {
    /// Evaluate chord members from a common start.
    ///
    /// Returns attribute changes made inside the chord followed by one
    /// `Chord` event (or a bare `Note` when only one note sounded). Rests are
    /// evaluated but dropped. The cursor moves to the smallest member end
    /// that differs from the start; if no member advanced, it stays put.
    pub fn chord(&mut self, members: &[Instruction]) -> Result<Vec<Event>> {
        let start = self.state.position();
        let start_offset = self.state.current_offset();
        let mut notes = Vec::new();
        let mut out = Vec::new();
        let mut resume: Option<f64> = None;

        for member in members {
            self.state.set_position(start);
            let mut produced = Vec::new();
            self.eval(member, &mut produced)?;
            if self.state.current_offset() != start_offset {
                let end = self.state.position();
                resume = Some(resume.map_or(end, |r| r.min(end)));
            }
            for event in produced {
                match event {
                    Event::Note(note) => notes.push(note),
                    Event::Chord(chord) => notes.extend(chord.notes),
                    Event::Rest(_) => {}
                    Event::AttributeChange(_) => out.push(event),
                }
            }
        }

        let end = resume.unwrap_or_else(|| {
            if !members.is_empty() {
                warn!("chord at {start_offset} has no member that advances the offset");
            }
            start
        });
        self.state.jump(start, end);

        match notes.len() {
            0 => {}
            1 => out.extend(notes.into_iter().map(Event::Note)),
            _ => out.push(Event::Chord(Chord {
                offset: start_offset,
                notes,
            })),
        }
        Ok(out)
    }

    /// Evaluate parallel voices from a common start.
    ///
    /// The cursor ends at the furthest point any voice reached.
    pub fn voices(&mut self, voices: &[VoiceSpec]) -> Result<VoiceGroup> {
        let start = self.state.position();
        let mut end = start;
        let mut group: Vec<(u32, Vec<Event>)> = Vec::new();

        for voice in voices {
            self.state.set_position(start);
            let events = self.eval_all(&voice.instructions)?;
            end = end.max(self.state.position());
            match group.iter_mut().find(|(id, _)| *id == voice.id) {
                Some((_, existing)) => existing.extend(events),
                None => group.push((voice.id, events)),
            }
        }

        self.state.jump(start, end);
        Ok(VoiceGroup {
            start: Beat::from_beats_f64(start),
            end: Beat::from_beats_f64(end),
            voices: group,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AttributeRegistry;
    use crate::eval::{NoteSpec, RestSpec};
    use std::sync::Arc;

    fn evaluator() -> Evaluator {
        Evaluator::new(Arc::new(AttributeRegistry::builtin()))
    }

    fn note(letter: char, denominator: u32) -> Instruction {
        Instruction::note(NoteSpec::new(letter).length(denominator))
    }

    #[test]
    fn chord_resumes_after_shortest_note() {
        let mut ev = evaluator();
        let events = ev.chord(&[note('c', 4), note('e', 8)]).unwrap();
        assert_eq!(events.len(), 1);
        let chord = events[0].as_chord().unwrap();
        assert_eq!(chord.notes.len(), 2);
        assert!(chord.notes.iter().all(|n| n.offset == Beat::ZERO));
        assert_eq!(ev.state().current_offset(), Beat::from_beats_f64(0.5));
    }

    #[test]
    fn chord_offset_is_min_of_members() {
        let mut ev = evaluator();
        ev.note(&NoteSpec::new('c').length(4)).unwrap();
        let start = ev.state().current_offset();
        ev.chord(&[note('c', 2), note('e', 1), note('g', 4)]).unwrap();
        assert_eq!(ev.state().current_offset() - start, Beat::from_beats(1));
        assert_eq!(ev.state().last_offset(), start);
    }

    #[test]
    fn single_note_chord_degenerates() {
        let mut ev = evaluator();
        let events = ev.chord(&[note('c', 2)]).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].as_note().unwrap().offset, Beat::ZERO);
        assert_eq!(ev.state().current_offset(), Beat::from_beats(2));
    }

    #[test]
    fn rests_count_only_when_they_advance() {
        let mut ev = evaluator();
        let events = ev
            .chord(&[
                note('c', 2),
                Instruction::rest(RestSpec::new().length(8)),
                note('e', 2),
            ])
            .unwrap();
        // The rest is dropped from the output but still the shortest member.
        assert_eq!(events[0].as_chord().unwrap().notes.len(), 2);
        assert_eq!(ev.state().current_offset(), Beat::from_beats_f64(0.5));
    }

    #[test]
    fn attribute_changes_inside_chord_are_kept_and_shared() {
        let mut ev = evaluator();
        let events = ev
            .chord(&[
                note('c', 4),
                Instruction::set("octave", ">"),
                note('c', 4),
            ])
            .unwrap();
        assert_eq!(events.len(), 2);
        assert!(events[0].as_attribute_change().is_some());
        let chord = events[1].as_chord().unwrap();
        assert_eq!(chord.notes[1].pitch, chord.notes[0].pitch * 2.0);
        assert_eq!(ev.state().current_offset(), Beat::from_beats(1));
    }

    #[test]
    fn chord_without_advancing_member_stays_at_start() {
        let mut ev = evaluator();
        let events = ev.chord(&[Instruction::set("vol", 50.0)]).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(ev.state().current_offset(), Beat::ZERO);
        assert!(ev.chord(&[]).unwrap().is_empty());
    }

    #[test]
    fn voices_resume_after_longest() {
        let mut ev = evaluator();
        let group = ev
            .voices(&[
                VoiceSpec {
                    id: 1,
                    instructions: vec![note('c', 4), note('d', 4)],
                },
                VoiceSpec {
                    id: 2,
                    instructions: vec![note('e', 1)],
                },
                VoiceSpec {
                    id: 3,
                    instructions: vec![note('g', 8)],
                },
            ])
            .unwrap();
        assert_eq!(group.start, Beat::ZERO);
        assert_eq!(group.end, Beat::from_beats(4));
        assert_eq!(ev.state().current_offset(), Beat::from_beats(4));
        assert_eq!(group.ids().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(group.voice(1).map(<[Event]>::len), Some(2));
        assert_eq!(group.voice(2).unwrap()[0].offset(), Beat::ZERO);
        assert_eq!(group.voice(3).unwrap()[0].offset(), Beat::ZERO);
        assert_eq!(group.into_events().len(), 4);
    }

    #[test]
    fn later_voices_see_earlier_attribute_changes() {
        let mut ev = evaluator();
        let group = ev
            .voices(&[
                VoiceSpec {
                    id: 1,
                    instructions: vec![Instruction::set("tempo", 60.0), note('c', 4)],
                },
                VoiceSpec {
                    id: 2,
                    instructions: vec![note('e', 4)],
                },
            ])
            .unwrap();
        let second = group.voice(2).unwrap()[0].as_note().unwrap();
        // One beat at 60 bpm, quantized to 90%.
        assert!((second.duration - 900.0).abs() < 1e-9);
    }

    #[test]
    fn voices_of_sevenths_and_quarters_meet() {
        let mut ev = evaluator();
        let sevenths = (0..7).map(|_| note('c', 7)).collect();
        let quarters = (0..4).map(|_| note('e', 4)).collect();
        let group = ev
            .voices(&[
                VoiceSpec {
                    id: 1,
                    instructions: sevenths,
                },
                VoiceSpec {
                    id: 2,
                    instructions: quarters,
                },
            ])
            .unwrap();
        assert_eq!(group.end, Beat::from_beats(4));
        assert_eq!(ev.state().current_offset(), Beat::from_beats(4));
    }

    #[test]
    fn repeated_voice_id_appends() {
        let mut ev = evaluator();
        let group = ev
            .voices(&[
                VoiceSpec {
                    id: 1,
                    instructions: vec![note('c', 4)],
                },
                VoiceSpec {
                    id: 1,
                    instructions: vec![note('e', 2)],
                },
            ])
            .unwrap();
        assert_eq!(group.voice(1).map(<[Event]>::len), Some(2));
        assert_eq!(ev.state().current_offset(), Beat::from_beats(2));
    }

    #[test]
    fn chord_nested_in_voice() {
        let mut ev = evaluator();
        let events = ev
            .eval_all(&[Instruction::Voices(vec![VoiceSpec {
                id: 1,
                instructions: vec![
                    Instruction::Chord(vec![note('c', 4), note('e', 4)]),
                    note('g', 4),
                ],
            }])])
            .unwrap();
        assert_eq!(events.len(), 2);
        assert!(events[0].as_chord().is_some());
        assert_eq!(events[1].offset(), Beat::from_beats(1));
    }
}
