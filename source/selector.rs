// The selector: a closed, four-variant tagged union over selection policies, each producing the
// next index into a corpus of known size. A class hierarchy or dynamic dispatch table would
// obscure what is, in practice, a single exhaustive switch.

use rand::seq::SliceRandom as _;
use rand::Rng as _;
use std::collections;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
  Random,
  Sequential,
  RandomNoRepeat,
  ShuffleCycle,
}

impl std::str::FromStr for Mode {
  type Err = String;

  fn from_str(value: &str) -> Result<Self, Self::Err> {
    match value {
      "random" => Ok(Mode::Random),
      "sequential" => Ok(Mode::Sequential),
      "random-no-repeat" => Ok(Mode::RandomNoRepeat),
      "shuffle-cycle" => Ok(Mode::ShuffleCycle),
      other => Err(format!("unknown selector mode {other:?}")),
    }
  }
}

// Deserialized straight from the `quotes.mode` TOML string via `FromStr`, so the config
// validation error and the parsing logic can't drift apart.
impl<'de> serde::Deserialize<'de> for Mode {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: serde::Deserializer<'de>,
  {
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
  }
}

enum State {
  Random,
  Sequential { position: usize },
  RandomNoRepeat { exhausted: collections::HashSet<usize> },
  ShuffleCycle { order: Vec<usize>, position: usize },
}

fn shuffled(size: usize) -> Vec<usize> {
  let mut order: Vec<usize> = (0..size).collect();
  order.shuffle(&mut rand::rng());
  order
}

fn fresh_state(mode: Mode, size: usize) -> State {
  match mode {
    Mode::Random => State::Random,
    Mode::Sequential => State::Sequential { position: 0 },
    Mode::RandomNoRepeat => State::RandomNoRepeat {
      exhausted: collections::HashSet::new(),
    },
    Mode::ShuffleCycle => State::ShuffleCycle {
      order: shuffled(size),
      position: 0,
    },
  }
}

// A stateful index generator over a corpus, according to a fixed policy. The policy (`mode`)
// never changes after construction; only the state backing it does, on `reset`.
pub struct Selector {
  mode: Mode,
  size: usize,
  state: State,
}

impl Selector {
  pub fn new(mode: Mode, size: usize) -> Self {
    Self {
      mode,
      size,
      state: fresh_state(mode, size),
    }
  }

  pub fn mode(&self) -> Mode {
    self.mode
  }

  // Prepare to serve a (possibly differently-sized) corpus. `mode` never changes.
  pub fn reset(&mut self, size: usize) {
    self.size = size;
    self.state = fresh_state(self.mode, size);
  }

  // Returns `None` iff the corpus is empty; otherwise an index in `[0, size)`.
  pub fn next(&mut self) -> Option<usize> {
    if self.size == 0 {
      return None;
    }
    Some(match &mut self.state {
      State::Random => rand::rng().random_range(0..self.size),
      State::Sequential { position } => {
        let index = *position;
        *position = (*position + 1) % self.size;
        index
      }
      State::RandomNoRepeat { exhausted } => {
        if exhausted.len() == self.size {
          exhausted.clear();
        }
        let index = loop {
          let candidate = rand::rng().random_range(0..self.size);
          if !exhausted.contains(&candidate) {
            break candidate;
          }
        };
        exhausted.insert(index);
        index
      }
      State::ShuffleCycle { order, position } => {
        if *position == self.size {
          order.shuffle(&mut rand::rng());
          *position = 0;
        }
        let index = order[*position];
        *position += 1;
        index
      }
    })
  }
}
