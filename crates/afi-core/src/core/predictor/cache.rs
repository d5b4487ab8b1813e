use super::{Prediction, PredictionError, Predictor};
use crate::core::models::sequence::Sequence;
use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Memoises the outcome of a deterministic predictor per sequence.
///
/// Failures are cached as well; a deterministic model fails the same way twice.
#[derive(Debug)]
pub struct CachingPredictor<P> {
    inner: P,
    cache: RwLock<HashMap<Sequence, Result<Prediction, PredictionError>>>,
    model_calls: AtomicUsize,
    hits: AtomicUsize,
}

impl<P: Predictor> CachingPredictor<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            cache: RwLock::new(HashMap::new()),
            model_calls: AtomicUsize::new(0),
            hits: AtomicUsize::new(0),
        }
    }

    /// Number of times the wrapped model was actually invoked.
    pub fn model_calls(&self) -> usize {
        self.model_calls.load(Ordering::Relaxed)
    }

    pub fn cache_hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.cache.read().map(|c| c.len()).unwrap_or_else(|e| e.into_inner().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_inner(self) -> P {
        self.inner
    }
}

impl<P: Predictor> Predictor for CachingPredictor<P> {
    fn species(&self) -> &[String] {
        self.inner.species()
    }

    fn assays(&self) -> &[String] {
        self.inner.assays()
    }

    fn model_version(&self) -> Option<&str> {
        self.inner.model_version()
    }

    fn predict(&self, sequence: &Sequence) -> Result<Prediction, PredictionError> {
        {
            let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
            if let Some(cached) = cache.get(sequence) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return cached.clone();
            }
        }

        // Two threads may race on the same miss; both results are identical.
        let outcome = self.inner.predict(sequence);
        self.model_calls.fetch_add(1, Ordering::Relaxed);

        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        cache
            .entry(sequence.clone())
            .or_insert_with(|| outcome.clone());
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    struct CountingPredictor {
        species: Vec<String>,
        assays: Vec<String>,
        calls: AtomicUsize,
    }

    impl Predictor for CountingPredictor {
        fn species(&self) -> &[String] {
            &self.species
        }
        fn assays(&self) -> &[String] {
            &self.assays
        }
        fn predict(&self, sequence: &Sequence) -> Result<Prediction, PredictionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if sequence.to_string().starts_with('P') {
                return Err(PredictionError::ModelFailure {
                    sequence: sequence.to_string(),
                    message: "proline start".to_string(),
                });
            }
            Ok(Prediction {
                mic: [("C_albicans", sequence.len() as f64)].into_iter().collect(),
                toxicity: [("hemolysis", 0.1)].into_iter().collect(),
            })
        }
    }

    fn counting() -> CountingPredictor {
        CountingPredictor {
            species: vec!["C_albicans".to_string()],
            assays: vec!["hemolysis".to_string()],
            calls: AtomicUsize::new(0),
        }
    }

    #[test]
    fn repeated_sequence_hits_the_cache() {
        let predictor = CachingPredictor::new(counting());
        let seq = Sequence::parse("KRWKRW").unwrap();

        let first = predictor.predict(&seq).unwrap();
        let second = predictor.predict(&seq).unwrap();

        assert_eq!(first, second);
        assert_eq!(predictor.model_calls(), 1);
        assert_eq!(predictor.cache_hits(), 1);
        assert_eq!(predictor.len(), 1);
    }

    #[test]
    fn failures_are_cached_too() {
        let predictor = CachingPredictor::new(counting());
        let seq = Sequence::parse("PKRWKR").unwrap();

        assert!(predictor.predict(&seq).is_err());
        assert!(predictor.predict(&seq).is_err());
        assert_eq!(predictor.into_inner().calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn concurrent_callers_see_identical_results() {
        let predictor = Arc::new(CachingPredictor::new(counting()));
        let seq = Sequence::parse("KRWKRWKR").unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let predictor = Arc::clone(&predictor);
                let seq = seq.clone();
                thread::spawn(move || predictor.predict(&seq).unwrap())
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(results.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(predictor.len(), 1);
        assert_eq!(predictor.model_calls() + predictor.cache_hits(), 8);
    }
}
