// ============================================================
// Layer 3 — Core Traits
// ============================================================
// The training use case only sees `SplitProvider`. The JSON
// loader in the data layer implements it for files on disk;
// tests implement it with synthetic in-memory samples.

use anyhow::Result;
use crate::domain::piano_roll::{PianoRoll, Split};

// ─── SplitProvider ────────────────────────────────────────────────────────────
/// Anything that can produce a labelled split for a fixed genre pair.
///
/// Implementations:
///   - JsonSplitLoader → reads {data_dir}/{genre}/{split}.json
///   - in-memory providers used by the tests
pub trait SplitProvider {
    /// Load every sample of the split, genre A first, then genre B.
    fn load_split(&self, split: Split) -> Result<Vec<PianoRoll>>;
}
