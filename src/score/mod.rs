//! Score assembler — resolves instrument references and folds each
//! instrument call's events into per-instance timelines.
//!
//! Attribute state is global to the score: it carries across instrument
//! calls. The offset cursor is not; each instance resumes where its own
//! timeline last ended, and a call naming several instances starts at the
//! latest of their resume points.

pub mod instrument;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::attribute::{AttributeRegistry, AttributeValues};
use crate::error::{EvalError, Result};
use crate::eval::{Evaluator, Instruction};
use crate::event::{Beat, InstrumentInstance, Timeline};

pub use instrument::{InstrumentCatalog, InstrumentReference};

/// One or more instrument references sharing the music that follows them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentCall {
    pub instruments: Vec<InstrumentReference>,
    #[serde(default)]
    pub music: Vec<Instruction>,
}

impl InstrumentCall {
    pub fn new(instruments: Vec<InstrumentReference>, music: Vec<Instruction>) -> Self {
        Self { instruments, music }
    }

    pub fn single(instrument: InstrumentReference, music: Vec<Instruction>) -> Self {
        Self::new(vec![instrument], music)
    }
}

/// A whole score as handed over by the parser.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreProgram {
    /// Attribute changes that appear before the first instrument call.
    #[serde(default)]
    pub globals: Vec<Instruction>,
    #[serde(default)]
    pub parts: Vec<InstrumentCall>,
}

/// The evaluated score: one timeline per instrument instance.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Score {
    parts: BTreeMap<InstrumentInstance, Timeline>,
    nicknames: BTreeMap<String, InstrumentInstance>,
    ends: BTreeMap<InstrumentInstance, Beat>,
    attributes: AttributeValues,
}

impl Score {
    pub fn part(&self, instance: &InstrumentInstance) -> Option<&Timeline> {
        self.parts.get(instance)
    }

    /// Timeline of `name` instance `number`.
    pub fn part_named(&self, name: &str, number: u32) -> Option<&Timeline> {
        self.parts.get(&InstrumentInstance::new(name, number))
    }

    pub fn parts(&self) -> impl Iterator<Item = (&InstrumentInstance, &Timeline)> {
        self.parts.iter()
    }

    pub fn instances(&self) -> impl Iterator<Item = &InstrumentInstance> {
        self.parts.keys()
    }

    /// Every instance of the named instrument, by number.
    pub fn instances_of<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a InstrumentInstance> {
        self.parts.keys().filter(move |i| i.name == name)
    }

    pub fn nickname(&self, nickname: &str) -> Option<&InstrumentInstance> {
        self.nicknames.get(nickname)
    }

    /// Where an instance's offset cursor stood when the score finished.
    pub fn end_offset(&self, instance: &InstrumentInstance) -> Option<Beat> {
        self.ends.get(instance).copied()
    }

    /// Attribute values in effect at the end of the score.
    pub fn attributes(&self) -> &AttributeValues {
        &self.attributes
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

/// Builds a [`Score`] from instrument calls, in source order.
pub struct ScoreAssembler {
    evaluator: Evaluator,
    catalog: InstrumentCatalog,
    parts: BTreeMap<InstrumentInstance, Timeline>,
    names: HashMap<String, InstrumentInstance>,
    highest: HashMap<String, u32>,
    nicknames: BTreeMap<String, InstrumentInstance>,
    resume: BTreeMap<InstrumentInstance, f64>,
}

impl ScoreAssembler {
    pub fn new(registry: Arc<AttributeRegistry>, catalog: InstrumentCatalog) -> Self {
        Self {
            evaluator: Evaluator::new(registry),
            catalog,
            parts: BTreeMap::new(),
            names: HashMap::new(),
            highest: HashMap::new(),
            nicknames: BTreeMap::new(),
            resume: BTreeMap::new(),
        }
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    /// Evaluate a whole program. Global attribute changes are prepended to
    /// the first call so they land on that instrument's timeline.
    pub fn assemble(mut self, program: &ScoreProgram) -> Result<Score> {
        match program.parts.split_first() {
            Some((first, rest)) => {
                if program.globals.is_empty() {
                    self.add_call(first)?;
                } else {
                    let mut music = program.globals.clone();
                    music.extend(first.music.iter().cloned());
                    self.add_call(&InstrumentCall::new(first.instruments.clone(), music))?;
                }
                for call in rest {
                    self.add_call(call)?;
                }
            }
            None => {
                debug!("score has no instrument calls; applying globals only");
                self.evaluator.eval_all(&program.globals)?;
            }
        }
        Ok(self.finish())
    }

    /// Resolve a call's instruments, evaluate its music, and append the
    /// resulting events to every resolved instance.
    pub fn add_call(&mut self, call: &InstrumentCall) -> Result<()> {
        let mut instances = BTreeSet::new();
        for reference in &call.instruments {
            instances.insert(self.resolve(reference)?);
        }
        if instances.is_empty() {
            warn!("instrument call without instruments; its events are discarded");
        }

        let start = instances
            .iter()
            .filter_map(|i| self.resume.get(i).copied())
            .fold(0.0, f64::max);
        let state = self.evaluator.state_mut();
        state.jump(start, start);
        state.active_instruments = instances.clone();

        let events = self.evaluator.eval_all(&call.music)?;
        let end = self.evaluator.state().position();

        for instance in instances {
            self.parts
                .entry(instance.clone())
                .or_default()
                .extend(events.iter().cloned());
            self.resume.insert(instance, end);
        }
        Ok(())
    }

    /// Map a reference to the instance it denotes, creating instances and
    /// binding nicknames as needed.
    pub fn resolve(&mut self, reference: &InstrumentReference) -> Result<InstrumentInstance> {
        let instance = self.lookup(reference)?;
        self.names.insert(instance.name.clone(), instance.clone());
        let highest = self.highest.entry(instance.name.clone()).or_insert(0);
        *highest = (*highest).max(instance.number);

        if let Some(nickname) = &reference.nickname {
            if !self.nicknames.contains_key(nickname) {
                debug!("nickname '{nickname}' bound to {instance}");
                self.nicknames.insert(nickname.clone(), instance.clone());
            }
        }
        Ok(instance)
    }

    fn lookup(&self, reference: &InstrumentReference) -> Result<InstrumentInstance> {
        if let Some(instance) = reference
            .nickname
            .as_ref()
            .and_then(|n| self.nicknames.get(n))
        {
            return Ok(instance.clone());
        }

        if !self.catalog.contains(&reference.name) {
            return self
                .nicknames
                .get(&reference.name)
                .cloned()
                .ok_or_else(|| EvalError::Resolution(reference.name.clone()));
        }

        if let Some(number) = reference.number {
            return Ok(InstrumentInstance::new(&reference.name, number));
        }

        if reference.nickname.is_some() || reference.new_instance {
            let number = self
                .highest
                .get(&reference.name)
                .map_or(1, |highest| highest + 1);
            let instance = InstrumentInstance::new(&reference.name, number);
            debug!("new instance {instance}");
            return Ok(instance);
        }

        Ok(self
            .names
            .get(&reference.name)
            .cloned()
            .unwrap_or_else(|| InstrumentInstance::new(&reference.name, 1)))
    }

    /// Stop accepting calls and hand out the score.
    pub fn finish(self) -> Score {
        Score {
            parts: self.parts,
            nicknames: self.nicknames,
            ends: self
                .resume
                .into_iter()
                .map(|(instance, end)| (instance, Beat::from_beats_f64(end)))
                .collect(),
            attributes: self.evaluator.state().attributes().clone(),
        }
    }
}

/// Evaluate a program with the built-in attributes and default catalog.
pub fn evaluate(program: &ScoreProgram) -> Result<Score> {
    evaluate_with(
        program,
        Arc::new(AttributeRegistry::builtin()),
        InstrumentCatalog::default(),
    )
}

/// Evaluate a program against a specific registry snapshot and catalog.
pub fn evaluate_with(
    program: &ScoreProgram,
    registry: Arc<AttributeRegistry>,
    catalog: InstrumentCatalog,
) -> Result<Score> {
    ScoreAssembler::new(registry, catalog).assemble(program)
}
