//! Collapsed Gibbs sampler state machine.
//!
//! ```text
//! Uninitialized --load--> Ready --run--> Sampling --> Converged
//!                                               \--> Stopped (cancelled)
//! ```
//!
//! `run` may be called again from `Converged` or `Stopped`, typically after
//! [`GibbsSampler::set_word_priors`] installs re-fitted priors.

use plda_types::{SamplerSettings, TopicIndex, TopicPriors, WordId, WordPriors};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::categorical;
use crate::convergence::{
    ConvergencePolicy, ConvergenceTracker, RunReport, SweepRecord, TerminationReason,
};
use crate::corpus::Corpus;
use crate::error::SamplerError;
use crate::estimate;
use crate::likelihood;
use crate::state::CountMatrices;

/// Lifecycle phase of a [`GibbsSampler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplerPhase {
    /// No corpus loaded
    Uninitialized,
    /// Corpus loaded with initial assignments
    Ready,
    /// Inside a run
    Sampling,
    /// Last run ended on its convergence policy
    Converged,
    /// Last run was cancelled
    Stopped,
}

/// Cloneable request to stop sampling at the next sweep boundary.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    token: CancellationToken,
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.token.cancel();
    }

    pub fn is_stop_requested(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl From<CancellationToken> for StopHandle {
    fn from(token: CancellationToken) -> Self {
        Self { token }
    }
}

/// Collapsed Gibbs sampler over a labeled or unlabeled corpus.
pub struct GibbsSampler<R: Rng> {
    num_topics: usize,
    topic_priors: TopicPriors,
    word_priors: WordPriors,
    corpus: Corpus,
    assignments: Vec<Vec<TopicIndex>>,
    counts: CountMatrices,
    /// Per-topic weights, reused for every token
    scratch: Vec<f64>,
    rng: R,
    phase: SamplerPhase,
    stop: StopHandle,
    total_sweeps: usize,
}

impl GibbsSampler<StdRng> {
    /// Symmetric priors and a seeded `StdRng` from settings.
    pub fn from_settings(
        settings: &SamplerSettings,
        vocab_size: usize,
    ) -> Result<Self, SamplerError> {
        settings.validate().map_err(SamplerError::InvalidArgument)?;
        let topic_priors = TopicPriors::symmetric(settings.num_topics, settings.alpha)?;
        let word_priors = WordPriors::symmetric(settings.num_topics, vocab_size, settings.beta)?;
        Self::new(topic_priors, word_priors, StdRng::seed_from_u64(settings.seed))
    }
}

impl<R: Rng> GibbsSampler<R> {
    /// # Errors
    ///
    /// `InvalidArgument` if the priors disagree on the number of topics.
    pub fn new(
        topic_priors: TopicPriors,
        word_priors: WordPriors,
        rng: R,
    ) -> Result<Self, SamplerError> {
        let num_topics = topic_priors.num_topics();
        if num_topics == 0 || word_priors.num_topics() != num_topics {
            return Err(SamplerError::InvalidArgument(format!(
                "topic priors have {} topics, word priors have {}",
                num_topics,
                word_priors.num_topics()
            )));
        }
        Ok(Self {
            num_topics,
            topic_priors,
            word_priors,
            corpus: Corpus::from_documents(Vec::new(), 0)?,
            assignments: Vec::new(),
            counts: CountMatrices::new(0, num_topics, 0),
            scratch: vec![0.0; num_topics],
            rng,
            phase: SamplerPhase::Uninitialized,
            stop: StopHandle::new(),
            total_sweeps: 0,
        })
    }

    /// Share `handle` as this sampler's stop request.
    pub fn with_stop_handle(mut self, handle: StopHandle) -> Self {
        self.stop = handle;
        self
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn phase(&self) -> SamplerPhase {
        self.phase
    }

    pub fn num_topics(&self) -> usize {
        self.num_topics
    }

    /// Sweeps completed over the sampler's lifetime.
    pub fn total_sweeps(&self) -> usize {
        self.total_sweeps
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn assignments(&self) -> &[Vec<TopicIndex>] {
        &self.assignments
    }

    pub fn counts(&self) -> &CountMatrices {
        &self.counts
    }

    pub fn word_priors(&self) -> &WordPriors {
        &self.word_priors
    }

    pub fn topic_priors(&self) -> &TopicPriors {
        &self.topic_priors
    }

    /// Take ownership of `corpus` and draw initial assignments.
    ///
    /// Each token starts on a uniformly chosen topic from its document's
    /// allowed set. Replaces any previously loaded corpus.
    #[instrument(skip(self, corpus), fields(documents = corpus.len()))]
    pub fn load(&mut self, corpus: Corpus) -> Result<(), SamplerError> {
        if corpus.vocab_size() != self.word_priors.vocab_size() {
            return Err(SamplerError::InvalidArgument(format!(
                "corpus vocabulary has {} words, priors have {}",
                corpus.vocab_size(),
                self.word_priors.vocab_size()
            )));
        }
        for doc in corpus.documents() {
            if let Some(labels) = &doc.labels {
                if labels.is_empty() {
                    return Err(SamplerError::InvalidArgument(format!(
                        "document {:?} has an empty label set",
                        doc.id
                    )));
                }
                if labels.iter().enumerate().any(|(i, t)| labels[..i].contains(t)) {
                    return Err(SamplerError::InvalidArgument(format!(
                        "document {:?} repeats a label",
                        doc.id
                    )));
                }
                if let Some(&topic) = labels.iter().find(|&&t| t >= self.num_topics) {
                    return Err(SamplerError::InvalidArgument(format!(
                        "document {:?} is labeled with topic {} but there are {} topics",
                        doc.id, topic, self.num_topics
                    )));
                }
            }
        }

        let mut assignments = Vec::with_capacity(corpus.len());
        for doc in corpus.documents() {
            let topics: Vec<TopicIndex> = doc
                .tokens
                .iter()
                .map(|_| match &doc.labels {
                    Some(labels) => labels[self.rng.random_range(0..labels.len())],
                    None => self.rng.random_range(0..self.num_topics),
                })
                .collect();
            assignments.push(topics);
        }

        self.counts = CountMatrices::from_assignments(&corpus, self.num_topics, &assignments);
        self.assignments = assignments;
        self.corpus = corpus;
        self.phase = SamplerPhase::Ready;

        info!(
            documents = self.corpus.len(),
            tokens = self.corpus.num_tokens(),
            topics = self.num_topics,
            "Sampler ready"
        );
        Ok(())
    }

    /// Replace the topic-word priors, e.g. after re-fitting between runs.
    pub fn set_word_priors(&mut self, priors: WordPriors) -> Result<(), SamplerError> {
        if priors.num_topics() != self.num_topics
            || priors.vocab_size() != self.word_priors.vocab_size()
        {
            return Err(SamplerError::InvalidArgument(format!(
                "word priors are {}x{}, sampler needs {}x{}",
                priors.num_topics(),
                priors.vocab_size(),
                self.num_topics,
                self.word_priors.vocab_size()
            )));
        }
        self.word_priors = priors;
        Ok(())
    }

    pub fn set_topic_priors(&mut self, priors: TopicPriors) -> Result<(), SamplerError> {
        if priors.num_topics() != self.num_topics {
            return Err(SamplerError::InvalidArgument(format!(
                "topic priors have {} topics, sampler has {}",
                priors.num_topics(),
                self.num_topics
            )));
        }
        self.topic_priors = priors;
        Ok(())
    }

    /// One pass over every token in document then token order.
    ///
    /// Returns how many tokens changed topic.
    pub fn sweep(&mut self) -> Result<usize, SamplerError> {
        self.ensure_loaded()?;

        let Self {
            num_topics,
            topic_priors,
            word_priors,
            corpus,
            assignments,
            counts,
            scratch,
            rng,
            ..
        } = self;
        let num_topics = *num_topics;
        let mut changed = 0;

        for (d, doc) in corpus.documents().iter().enumerate() {
            for (i, &word) in doc.tokens.iter().enumerate() {
                let old = assignments[d][i];
                counts.unassign(d, word, old);

                fill_weights(
                    scratch,
                    num_topics,
                    d,
                    word,
                    doc.labels.as_deref(),
                    counts,
                    topic_priors,
                    word_priors,
                );

                let new = match categorical::draw(scratch, rng) {
                    Ok(topic) => topic,
                    Err(e) => {
                        counts.assign(d, word, old);
                        return Err(e);
                    }
                };
                counts.assign(d, word, new);
                if new != old {
                    assignments[d][i] = new;
                    changed += 1;
                }
            }
        }

        self.total_sweeps += 1;
        Ok(changed)
    }

    /// Sweep until the policy or a stop request ends the run.
    #[instrument(skip(self, policy), fields(max_sweeps = policy.max_sweeps))]
    pub fn run(&mut self, policy: &ConvergencePolicy) -> Result<RunReport, SamplerError> {
        self.ensure_loaded()?;
        policy.validate()?;

        let num_tokens = self.corpus.num_tokens();
        let track_likelihood = policy.tracks_likelihood();
        let mut tracker = ConvergenceTracker::new(policy);
        self.phase = SamplerPhase::Sampling;

        let reason = loop {
            if self.stop.is_stop_requested() {
                self.phase = SamplerPhase::Stopped;
                break TerminationReason::Cancelled;
            }

            let changed = match self.sweep() {
                Ok(changed) => changed,
                Err(e) => {
                    self.phase = SamplerPhase::Stopped;
                    return Err(e);
                }
            };
            let record = SweepRecord {
                sweep: tracker.history().len() + 1,
                log_likelihood: track_likelihood.then(|| self.log_likelihood()),
                change_rate: if num_tokens == 0 {
                    0.0
                } else {
                    changed as f64 / num_tokens as f64
                },
            };
            debug!(
                sweep = record.sweep,
                log_likelihood = ?record.log_likelihood,
                change_rate = record.change_rate,
                "Sweep complete"
            );
            tracker.record(record);

            if let Some(reason) = tracker.check() {
                self.phase = SamplerPhase::Converged;
                break reason;
            }
        };

        let history = tracker.into_history();
        let log_likelihood = match history.last().and_then(|last| last.log_likelihood) {
            Some(ll) => ll,
            None => self.log_likelihood(),
        };
        let change_rate = history.last().map_or(0.0, |last| last.change_rate);
        info!(
            sweeps = history.len(),
            reason = %reason,
            log_likelihood,
            "Sampling run finished"
        );

        Ok(RunReport {
            sweeps: history.len(),
            reason,
            log_likelihood,
            change_rate,
            history,
        })
    }

    /// Collapsed joint log-likelihood of the current state.
    pub fn log_likelihood(&self) -> f64 {
        likelihood::log_likelihood(
            &self.corpus,
            &self.counts,
            &self.topic_priors,
            &self.word_priors,
        )
    }

    /// Recount from the assignments and compare with the live counts.
    pub fn check_invariants(&self) -> Result<(), SamplerError> {
        self.counts.check(&self.corpus, &self.assignments)
    }

    /// Document-topic distributions (D x K).
    pub fn theta(&self) -> Vec<Vec<f64>> {
        estimate::theta(&self.corpus, &self.counts, &self.topic_priors)
    }

    /// Topic-word distributions (K x V).
    pub fn phi(&self) -> Vec<Vec<f64>> {
        estimate::phi(&self.counts, &self.word_priors)
    }

    pub fn top_words(&self, n: usize) -> Vec<Vec<(WordId, f64)>> {
        estimate::top_words(&self.phi(), n)
    }

    fn ensure_loaded(&self) -> Result<(), SamplerError> {
        if self.phase == SamplerPhase::Uninitialized {
            return Err(SamplerError::InvalidState("no corpus loaded".to_string()));
        }
        Ok(())
    }
}

/// `(n_dt + alpha_t)(n_tw + beta_tw) / (n_t + sum beta_t)` per topic, zero for
/// topics a labeled document does not allow.
#[allow(clippy::too_many_arguments)]
#[inline]
fn fill_weights(
    weights: &mut [f64],
    num_topics: usize,
    doc: usize,
    word: WordId,
    labels: Option<&[TopicIndex]>,
    counts: &CountMatrices,
    topic_priors: &TopicPriors,
    word_priors: &WordPriors,
) {
    let weight = |t: TopicIndex| {
        (f64::from(counts.doc_topic(doc, t)) + topic_priors.get(t))
            * (f64::from(counts.topic_word(t, word)) + word_priors.get(t, word))
            / (f64::from(counts.topic_total(t)) + word_priors.sum(t))
    };

    match labels {
        Some(labels) => {
            weights.fill(0.0);
            for &t in labels {
                weights[t] = weight(t);
            }
        }
        None => {
            for (t, w) in weights.iter_mut().enumerate().take(num_topics) {
                *w = weight(t);
            }
        }
    }
}
