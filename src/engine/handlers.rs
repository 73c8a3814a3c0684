use super::{Match, TriggerPatternEngine};
use crate::error::PatternError;
use crate::parse::CompilationUnit;
use crate::pattern::{ParsedPattern, Pattern, PatternParser};

/// Callback invoked once per match of the pattern it was registered with.
pub trait MatchHandler: Send {
    fn handle(&mut self, pattern: &Pattern, m: &Match<'_>);
}

impl<F> MatchHandler for F
where
    F: FnMut(&Pattern, &Match<'_>) + Send,
{
    fn handle(&mut self, pattern: &Pattern, m: &Match<'_>) {
        self(pattern, m)
    }
}

/// Table of pattern/handler pairs, built once and dispatched per unit.
#[derive(Default)]
pub struct HandlerRegistry {
    entries: Vec<(ParsedPattern, Box<dyn MatchHandler>)>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `pattern` and pair it with `handler`.
    pub fn register(
        &mut self,
        pattern: Pattern,
        handler: impl MatchHandler + 'static,
    ) -> Result<&mut Self, PatternError> {
        let parsed = PatternParser::new().parse(&pattern)?;
        self.entries.push((parsed, Box::new(handler)));
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn patterns(&self) -> impl Iterator<Item = &Pattern> {
        self.entries.iter().map(|(parsed, _)| parsed.pattern())
    }

    /// Run every registered pattern over `unit`, calling each handler with
    /// its matches in source order. Returns the number of matches handled.
    pub fn dispatch(&mut self, unit: &CompilationUnit) -> usize {
        let engine = TriggerPatternEngine::new();
        let mut handled = 0;
        for (parsed, handler) in &mut self.entries {
            for m in engine.find_matches_parsed(unit, parsed) {
                handler.handle(parsed.pattern(), &m);
                handled += 1;
            }
        }
        handled
    }
}
