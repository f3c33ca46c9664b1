//! Collision event log and rising-edge detection.

use std::collections::HashSet;
use std::fmt;

/// Kind of contact recorded in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CollisionKind {
    Obstacle,
    SelfCollision,
}

impl fmt::Display for CollisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollisionKind::Obstacle => f.write_str("obstacle"),
            CollisionKind::SelfCollision => f.write_str("self"),
        }
    }
}

/// Identity of one contact across ticks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContactKey {
    pub kind: CollisionKind,
    pub a: String,
    pub b: String,
}

impl ContactKey {
    pub fn new(kind: CollisionKind, a: impl Into<String>, b: impl Into<String>) -> Self {
        Self {
            kind,
            a: a.into(),
            b: b.into(),
        }
    }
}

/// Remembers which contacts were active on the previous tick.
#[derive(Debug, Clone, Default)]
pub struct EdgeTracker {
    active: HashSet<ContactKey>,
}

impl EdgeTracker {
    /// Replace the active set with `current` and return the keys that were
    /// not active before, in input order.
    pub fn rising(&mut self, current: impl IntoIterator<Item = ContactKey>) -> Vec<ContactKey> {
        let mut next = HashSet::new();
        let mut entered = Vec::new();
        for key in current {
            if next.contains(&key) {
                continue;
            }
            if !self.active.contains(&key) {
                entered.push(key.clone());
            }
            next.insert(key);
        }
        self.active = next;
        entered
    }

    pub fn is_active(&self, key: &ContactKey) -> bool {
        self.active.contains(key)
    }

    pub fn reset(&mut self) {
        self.active.clear();
    }
}

/// One logged contact.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportEvent {
    /// Simulation time in seconds since playback started.
    pub sim_time: f64,
    /// 1-based layer that was active.
    pub layer: i32,
    pub kind: CollisionKind,
    pub a: String,
    pub b: String,
}

impl fmt::Display for ReportEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = if self.sim_time.is_finite() { self.sim_time } else { 0.0 };
        write!(
            f,
            "[t={:.2}s, Layer {}] {} <-> {} ({})",
            t, self.layer, self.a, self.b, self.kind
        )
    }
}

/// Append-only log of contacts seen during playback.
#[derive(Debug, Clone, Default)]
pub struct PlaybackReport {
    events: Vec<ReportEvent>,
}

impl PlaybackReport {
    pub fn push(&mut self, event: ReportEvent) {
        self.events.push(event);
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn events(&self) -> &[ReportEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// One line per event sorted by time then layer.
    pub fn to_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PlaybackReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.events.is_empty() {
            return f.write_str("(no collisions recorded)");
        }
        let mut sorted: Vec<&ReportEvent> = self.events.iter().collect();
        sorted.sort_by(|a, b| {
            a.sim_time
                .total_cmp(&b.sim_time)
                .then_with(|| a.layer.cmp(&b.layer))
        });
        for (i, event) in sorted.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{event}")?;
        }
        Ok(())
    }
}
