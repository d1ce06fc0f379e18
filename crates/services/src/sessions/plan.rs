use rand::seq::SliceRandom;
use rand::{Rng, rng};
use std::collections::HashSet;
use tracing::{debug, warn};

use qudratak_core::model::{Category, Question, QuestionId, QuestionPool, Section, TestConfiguration};

use crate::error::SessionError;

/// How questions are picked from the pool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SelectionPolicy {
    /// Take questions in pool order. Deterministic.
    #[default]
    InPoolOrder,
    /// Drop every question in `seen`, shuffle what is left per category,
    /// then slice exactly like `InPoolOrder`. For repeated practice.
    ShuffleUnseen { seen: HashSet<QuestionId> },
}

/// Where a qiyas section landed in the ordered question list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionSpan {
    pub section: Section,
    pub start: usize,
    /// Questions actually selected; lower than `section.questions_count`
    /// when the pool ran short.
    pub len: usize,
}

impl SectionSpan {
    #[must_use]
    pub fn contains(&self, position: usize) -> bool {
        position >= self.start && position < self.start + self.len
    }
}

/// Selection result for a session build.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionPlan {
    pub questions: Vec<Question>,
    pub verbal_selected: usize,
    pub quantitative_selected: usize,
    pub sections: Vec<SectionSpan>,
}

impl SessionPlan {
    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    fn push(&mut self, category: Category, questions: &[&Question]) {
        match category {
            Category::Verbal => self.verbal_selected += questions.len(),
            Category::Quantitative => self.quantitative_selected += questions.len(),
        }
        self.questions.extend(questions.iter().map(|q| (*q).clone()));
    }
}

/// Turns a `TestConfiguration` into an ordered question list.
///
/// Never mutates the pool.
pub struct SessionBuilder<'a, P: QuestionPool + ?Sized> {
    pool: &'a P,
    policy: SelectionPolicy,
}

impl<'a, P: QuestionPool + ?Sized> SessionBuilder<'a, P> {
    #[must_use]
    pub fn new(pool: &'a P) -> Self {
        Self {
            pool,
            policy: SelectionPolicy::InPoolOrder,
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: SelectionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Build a plan, using the thread RNG when the policy shuffles.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InsufficientQuestions` if nothing could be selected.
    pub fn build(&self, config: &TestConfiguration) -> Result<SessionPlan, SessionError> {
        let mut rng = rng();
        self.build_with_rng(config, &mut rng)
    }

    /// Build a plan with a caller-supplied RNG.
    ///
    /// - `standard` / `custom`: the first `verbalQuestions` verbal candidates
    ///   followed by the first `quantitativeQuestions` quantitative ones.
    /// - `qiyas`: sections in order, each taking the next unconsumed slice of
    ///   its category; one running cursor per category.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InsufficientQuestions` if nothing could be selected.
    pub fn build_with_rng<R: Rng + ?Sized>(
        &self,
        config: &TestConfiguration,
        rng: &mut R,
    ) -> Result<SessionPlan, SessionError> {
        let verbal = self.candidates(Category::Verbal, rng);
        let quantitative = self.candidates(Category::Quantitative, rng);
        let candidates_of = |category: Category| match category {
            Category::Verbal => verbal.as_slice(),
            Category::Quantitative => quantitative.as_slice(),
        };

        let mut plan = SessionPlan::default();
        if config.sections().is_empty() {
            for (category, requested) in [
                (Category::Verbal, config.verbal_questions()),
                (Category::Quantitative, config.quantitative_questions()),
            ] {
                let picked = take_slice(candidates_of(category), 0, requested);
                warn_if_short(category, requested, picked.len());
                plan.push(category, picked);
            }
        } else {
            let mut verbal_cursor = 0_usize;
            let mut quantitative_cursor = 0_usize;
            for section in config.sections() {
                let cursor = match section.category {
                    Category::Verbal => &mut verbal_cursor,
                    Category::Quantitative => &mut quantitative_cursor,
                };
                let picked = take_slice(candidates_of(section.category), *cursor, section.questions_count);
                *cursor += picked.len();
                warn_if_short(section.category, section.questions_count, picked.len());

                plan.sections.push(SectionSpan {
                    section: *section,
                    start: plan.questions.len(),
                    len: picked.len(),
                });
                plan.push(section.category, picked);
            }
        }

        if plan.is_empty() {
            let available = Category::ALL
                .iter()
                .filter(|c| requested_for(config, **c) > 0)
                .map(|c| candidates_of(*c).len())
                .sum();
            return Err(SessionError::InsufficientQuestions {
                requested: config.requested_total(),
                available,
            });
        }

        debug!(
            mode = %config.mode(),
            verbal = plan.verbal_selected,
            quantitative = plan.quantitative_selected,
            "built session plan"
        );
        Ok(plan)
    }

    fn candidates<R: Rng + ?Sized>(&self, category: Category, rng: &mut R) -> Vec<&'a Question> {
        let all = self.pool.questions_of_category(category);
        match &self.policy {
            SelectionPolicy::InPoolOrder => all.iter().collect(),
            SelectionPolicy::ShuffleUnseen { seen } => {
                let mut eligible: Vec<&Question> =
                    all.iter().filter(|q| !seen.contains(&q.id())).collect();
                eligible.shuffle(rng);
                debug!(
                    %category,
                    eligible = eligible.len(),
                    excluded = all.len() - eligible.len(),
                    "shuffled unseen questions"
                );
                eligible
            }
        }
    }
}

fn requested_for(config: &TestConfiguration, category: Category) -> u32 {
    match category {
        Category::Verbal => config.verbal_questions(),
        Category::Quantitative => config.quantitative_questions(),
    }
}

fn take_slice<'q, 'a>(candidates: &'q [&'a Question], start: usize, count: u32) -> &'q [&'a Question] {
    let rest = candidates.get(start..).unwrap_or(&[]);
    let count = usize::try_from(count).unwrap_or(usize::MAX).min(rest.len());
    &rest[..count]
}

fn warn_if_short(category: Category, requested: u32, selected: usize) {
    if usize::try_from(requested).is_ok_and(|requested| selected < requested) {
        warn!(%category, requested, selected, "question pool ran short");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qudratak_core::model::{InMemoryQuestionPool, QiyasLayout};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn build_question(id: u64, category: Category) -> Question {
        Question::new(
            QuestionId::new(id),
            category,
            format!("Q{id}"),
            vec!["a".into(), "b".into(), "c".into(), "d".into()],
            0,
        )
        .unwrap()
    }

    /// Verbal ids 1..=verbal, quantitative ids 1001..=1000+quantitative.
    fn build_pool(verbal: u64, quantitative: u64) -> InMemoryQuestionPool {
        let v = (1..=verbal).map(|i| build_question(i, Category::Verbal));
        let q = (1..=quantitative).map(|i| build_question(1000 + i, Category::Quantitative));
        InMemoryQuestionPool::from_questions(v.chain(q)).unwrap()
    }

    fn ids(plan: &SessionPlan) -> Vec<u64> {
        plan.questions.iter().map(|q| q.id().value()).collect()
    }

    #[test]
    fn custom_takes_verbal_then_quantitative_in_pool_order() {
        let pool = build_pool(5, 5);
        let config = TestConfiguration::custom(3, 2, 10).unwrap();

        let plan = SessionBuilder::new(&pool).build(&config).unwrap();

        assert_eq!(ids(&plan), vec![1, 2, 3, 1001, 1002]);
        assert_eq!(plan.verbal_selected, 3);
        assert_eq!(plan.quantitative_selected, 2);
        assert!(plan.sections.is_empty());
    }

    #[test]
    fn standard_quantitative_only() {
        let pool = build_pool(30, 30);
        let plan = SessionBuilder::new(&pool)
            .build(&TestConfiguration::standard(Category::Quantitative))
            .unwrap();
        assert_eq!(plan.total(), 20);
        assert!(plan.questions.iter().all(|q| q.category() == Category::Quantitative));
        assert_eq!(plan.questions[0].id().value(), 1001);
    }

    #[test]
    fn qiyas_interleaves_sections_with_running_cursors() {
        let pool = build_pool(10, 10);
        let layout = QiyasLayout::from_sections(
            10,
            vec![
                Section::new(1, Category::Verbal, 2, 2),
                Section::new(2, Category::Quantitative, 3, 3),
                Section::new(3, Category::Verbal, 2, 2),
                Section::new(4, Category::Quantitative, 1, 1),
            ],
        )
        .unwrap();
        let config = TestConfiguration::Qiyas(layout);

        let plan = SessionBuilder::new(&pool).build(&config).unwrap();

        assert_eq!(ids(&plan), vec![1, 2, 1001, 1002, 1003, 3, 4, 1004]);
        let starts: Vec<(usize, usize)> = plan.sections.iter().map(|s| (s.start, s.len)).collect();
        assert_eq!(starts, vec![(0, 2), (2, 3), (5, 2), (7, 1)]);
    }

    #[test]
    fn qiyas_preset_category_sequence_matches_sections() {
        let pool = build_pool(65, 55);
        let config = TestConfiguration::qiyas();
        let plan = SessionBuilder::new(&pool).build(&config).unwrap();

        let expected: Vec<Category> = config
            .sections()
            .iter()
            .flat_map(|s| std::iter::repeat_n(s.category, s.questions_count as usize))
            .collect();
        let actual: Vec<Category> = plan.questions.iter().map(Question::category).collect();
        assert_eq!(actual, expected);
        assert_eq!(plan.total(), 120);
    }

    #[test]
    fn missing_category_is_insufficient() {
        let pool = build_pool(0, 10);
        let config = TestConfiguration::custom(5, 0, 10).unwrap();

        let err = SessionBuilder::new(&pool).build(&config).unwrap_err();
        assert!(matches!(
            err,
            SessionError::InsufficientQuestions { requested: 5, available: 0 }
        ));
    }

    #[test]
    fn all_zero_counts_is_insufficient() {
        let pool = build_pool(5, 5);
        let config = TestConfiguration::custom(0, 0, 10).unwrap();
        assert!(matches!(
            SessionBuilder::new(&pool).build(&config),
            Err(SessionError::InsufficientQuestions { requested: 0, .. })
        ));
    }

    #[test]
    fn short_pool_fills_partially() {
        let pool = build_pool(2, 0);
        let config = TestConfiguration::custom(5, 3, 10).unwrap();
        let plan = SessionBuilder::new(&pool).build(&config).unwrap();
        assert_eq!(ids(&plan), vec![1, 2]);
    }

    #[test]
    fn shuffle_unseen_excludes_seen_and_respects_counts() {
        let pool = build_pool(10, 10);
        let seen: HashSet<QuestionId> = (1..=6).map(QuestionId::new).collect();
        let config = TestConfiguration::custom(4, 2, 10).unwrap();
        let mut rng = StdRng::seed_from_u64(7);

        let plan = SessionBuilder::new(&pool)
            .with_policy(SelectionPolicy::ShuffleUnseen { seen: seen.clone() })
            .build_with_rng(&config, &mut rng)
            .unwrap();

        assert_eq!(plan.verbal_selected, 4);
        assert_eq!(plan.quantitative_selected, 2);
        assert!(plan.questions.iter().all(|q| !seen.contains(&q.id())));
        assert!(plan.questions[..4].iter().all(|q| q.category() == Category::Verbal));
        let unique: HashSet<_> = plan.questions.iter().map(Question::id).collect();
        assert_eq!(unique.len(), plan.total());
    }

    #[test]
    fn shuffle_is_deterministic_for_a_seed() {
        let pool = build_pool(20, 0);
        let config = TestConfiguration::custom(10, 0, 10).unwrap();
        let builder = SessionBuilder::new(&pool).with_policy(SelectionPolicy::ShuffleUnseen {
            seen: HashSet::new(),
        });

        let a = builder.build_with_rng(&config, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = builder.build_with_rng(&config, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(ids(&a), ids(&b));
    }

    #[test]
    fn everything_seen_is_insufficient() {
        let pool = build_pool(3, 0);
        let seen: HashSet<QuestionId> = (1..=3).map(QuestionId::new).collect();
        let config = TestConfiguration::custom(3, 0, 10).unwrap();
        let err = SessionBuilder::new(&pool)
            .with_policy(SelectionPolicy::ShuffleUnseen { seen })
            .build(&config)
            .unwrap_err();
        assert!(matches!(err, SessionError::InsufficientQuestions { available: 0, .. }));
    }
}
