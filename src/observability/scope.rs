//! Begin/complete logging around a unit of work
//!
//! - `{name}_BEGIN` on creation
//! - `{name}_COMPLETE` with `elapsed_ms` on `complete()`
//! - `{name}_FAILED` on `fail()`
//! - `{name}_INCOMPLETE` if dropped without either (error propagated with `?`)

use std::time::Instant;

use super::logger::{Logger, Severity};

pub struct ObservationScope {
    name: &'static str,
    severity: Severity,
    fields: Vec<(&'static str, String)>,
    timer: Timer,
    finished: bool,
}

impl ObservationScope {
    pub fn new(name: &'static str) -> Self {
        Self::with_fields(name, Severity::Info, Vec::new())
    }

    /// Scope whose begin/complete lines carry `fields` and log at `severity`
    pub fn with_fields(
        name: &'static str,
        severity: Severity,
        fields: Vec<(&'static str, String)>,
    ) -> Self {
        if Logger::enabled(severity) {
            Logger::log(severity, &format!("{}_BEGIN", name), &borrow(&fields, &[]));
        }
        Self {
            name,
            severity,
            fields,
            timer: Timer::new(),
            finished: false,
        }
    }

    pub fn complete(self) {
        self.complete_with_fields(&[]);
    }

    pub fn complete_with_fields(mut self, extra: &[(&str, &str)]) {
        self.finished = true;
        if Logger::enabled(self.severity) {
            let elapsed = self.timer.elapsed_ms();
            let mut fields = borrow(&self.fields, extra);
            fields.push(("elapsed_ms", &elapsed));
            Logger::log(self.severity, &format!("{}_COMPLETE", self.name), &fields);
        }
    }

    pub fn fail(mut self, reason: &str) {
        self.finished = true;
        let mut fields = borrow(&self.fields, &[]);
        fields.push(("reason", reason));
        Logger::error(&format!("{}_FAILED", self.name), &fields);
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

fn borrow<'a>(owned: &'a [(&'static str, String)], extra: &[(&'a str, &'a str)]) -> Vec<(&'a str, &'a str)> {
    owned
        .iter()
        .map(|(k, v)| (*k, v.as_str()))
        .chain(extra.iter().copied())
        .collect()
}

impl Drop for ObservationScope {
    fn drop(&mut self) {
        if !self.finished {
            Logger::warn(
                &format!("{}_INCOMPLETE", self.name),
                &[("reason", "scope dropped without completion")],
            );
        }
    }
}

/// Wall-clock timer for elapsed-time fields
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> String {
        self.elapsed_millis().to_string()
    }

    pub fn elapsed_millis(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_marks_finished() {
        let scope = ObservationScope::new("TEST");
        assert!(!scope.is_finished());
        scope.complete();
    }

    #[test]
    fn test_fields_and_extra() {
        let scope = ObservationScope::with_fields(
            "TEST",
            Severity::Trace,
            vec![("rows", "10".to_string())],
        );
        scope.complete_with_fields(&[("runs", "2")]);
    }

    #[test]
    fn test_drop_without_complete_does_not_panic() {
        let scope = ObservationScope::new("TEST");
        drop(scope);
    }

    #[test]
    fn test_timer_parses() {
        let timer = Timer::new();
        let ms: u64 = timer.elapsed_ms().parse().unwrap();
        assert!(ms < 60_000);
    }
}
