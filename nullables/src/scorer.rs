//! Nullable scorer: scripted verdicts, no network.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use sigver_scorer::{ScoreInput, ScorerError, ScorerVerdict, SignatureScorer};

/// A scorer whose answers are set up by the test.
///
/// Scripted outcomes are consumed in order; once the script is empty every
/// call returns the default verdict.
pub struct NullScorer {
    default: ScorerVerdict,
    script: Mutex<VecDeque<Result<ScorerVerdict, ScorerError>>>,
    calls: AtomicUsize,
    last_request: Mutex<Option<(ScoreInput, ScoreInput)>>,
}

impl NullScorer {
    /// Always answers `verdict` unless something else was scripted.
    pub fn returning(verdict: ScorerVerdict) -> Self {
        Self {
            default: verdict,
            script: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Queue one outcome for the next call.
    pub fn push(&self, outcome: Result<ScorerVerdict, ScorerError>) {
        self.script.lock().unwrap().push_back(outcome);
    }

    /// Queue a transport failure for the next call.
    pub fn push_unreachable(&self) {
        self.push(Err(ScorerError::Unreachable("null scorer offline".into())));
    }

    /// How many times `score` has been invoked.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Filenames of the (reference, probe) pair most recently scored.
    pub fn last_filenames(&self) -> Option<(String, String)> {
        self.last_request
            .lock()
            .unwrap()
            .as_ref()
            .map(|(r, p)| (r.filename.clone(), p.filename.clone()))
    }
}

impl Default for NullScorer {
    fn default() -> Self {
        Self::returning(ScorerVerdict {
            is_match: true,
            similarity: Some(0.9),
        })
    }
}

#[async_trait]
impl SignatureScorer for NullScorer {
    async fn score(
        &self,
        reference: &ScoreInput,
        probe: &ScoreInput,
    ) -> Result<ScorerVerdict, ScorerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some((reference.clone(), probe.clone()));
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(self.default))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str) -> ScoreInput {
        ScoreInput {
            filename: name.into(),
            bytes: vec![0],
        }
    }

    #[tokio::test]
    async fn script_then_default() {
        let scorer = NullScorer::default();
        scorer.push_unreachable();

        assert!(scorer.score(&input("r"), &input("p")).await.is_err());
        let verdict = scorer.score(&input("r"), &input("p2")).await.unwrap();
        assert!(verdict.is_match);
        assert_eq!(scorer.calls(), 2);
        assert_eq!(scorer.last_filenames(), Some(("r".into(), "p2".into())));
    }
}
