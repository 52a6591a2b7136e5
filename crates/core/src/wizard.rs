//! Multi-step activity builder.
//!
//! Teachers and admins build activities in three steps:
//!
//! ```text
//! Details ──next──▶ Questions ──next──▶ Review ──finish──▶ NewActivity
//!    ◀──back───────────  ◀──back──────────
//! ```
//!
//! `next` validates the step being left; `back` never validates. Questions can
//! only be edited on the Questions step.

use std::collections::HashSet;

use chrono::NaiveDate;
use thiserror::Error;

use crate::validation::{Field, ValidationErrors};
use crate::{Activity, ActivityKind, NewActivity, Question};

/// Steps of the activity wizard, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WizardStep {
    Details,
    Questions,
    Review,
}

/// Errors raised by [`ActivityWizard`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
    /// The operation is not available on the current step.
    #[error("not available on the {actual:?} step (needs {expected:?})")]
    WrongStep {
        expected: WizardStep,
        actual: WizardStep,
    },

    /// There is no step after Review; use `finish`.
    #[error("already on the last step")]
    NoNextStep,

    /// Question index out of range.
    #[error("no question at position {0}")]
    NoSuchQuestion(usize),

    /// The step being left has invalid fields.
    #[error("{0}")]
    Invalid(#[from] ValidationErrors),
}

/// State of an activity being built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityWizard {
    step: WizardStep,
    pub title: String,
    pub instructions: String,
    pub kind: ActivityKind,
    pub due_date: Option<NaiveDate>,
    pub tags: Vec<String>,
    questions: Vec<Question>,
}

impl ActivityWizard {
    /// Start an empty wizard on the Details step.
    #[must_use]
    pub const fn new(kind: ActivityKind) -> Self {
        Self {
            step: WizardStep::Details,
            title: String::new(),
            instructions: String::new(),
            kind,
            due_date: None,
            tags: Vec::new(),
            questions: Vec::new(),
        }
    }

    /// Start a wizard pre-filled from an existing activity, for editing.
    #[must_use]
    pub fn from_activity(activity: &Activity) -> Self {
        Self {
            step: WizardStep::Details,
            title: activity.title.clone(),
            instructions: activity.instructions.clone(),
            kind: activity.kind,
            due_date: activity.due_date,
            tags: activity.tags.clone(),
            questions: activity.questions.clone(),
        }
    }

    /// The current step.
    #[must_use]
    pub const fn step(&self) -> WizardStep {
        self.step
    }

    /// Questions added so far.
    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    fn require_step(&self, expected: WizardStep) -> Result<(), WizardError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(WizardError::WrongStep {
                expected,
                actual: self.step,
            })
        }
    }

    /// Append a question. Returns its index.
    ///
    /// # Errors
    ///
    /// Returns `WrongStep` unless on the Questions step.
    pub fn add_question(&mut self, question: Question) -> Result<usize, WizardError> {
        self.require_step(WizardStep::Questions)?;
        self.questions.push(question);
        Ok(self.questions.len() - 1)
    }

    /// Replace the question at `index`.
    ///
    /// # Errors
    ///
    /// Returns `WrongStep` unless on the Questions step, `NoSuchQuestion` if
    /// `index` is out of range.
    pub fn replace_question(&mut self, index: usize, question: Question) -> Result<(), WizardError> {
        self.require_step(WizardStep::Questions)?;
        let slot = self
            .questions
            .get_mut(index)
            .ok_or(WizardError::NoSuchQuestion(index))?;
        *slot = question;
        Ok(())
    }

    /// Remove and return the question at `index`.
    ///
    /// # Errors
    ///
    /// Returns `WrongStep` unless on the Questions step, `NoSuchQuestion` if
    /// `index` is out of range.
    pub fn remove_question(&mut self, index: usize) -> Result<Question, WizardError> {
        self.require_step(WizardStep::Questions)?;
        if index >= self.questions.len() {
            return Err(WizardError::NoSuchQuestion(index));
        }
        Ok(self.questions.remove(index))
    }

    /// Validate the current step and advance.
    ///
    /// # Errors
    ///
    /// Returns `Invalid` with the step's field errors, or `NoNextStep` on
    /// Review.
    pub fn next(&mut self) -> Result<WizardStep, WizardError> {
        self.step = match self.step {
            WizardStep::Details => {
                self.validate_details().into_result(|| ())?;
                WizardStep::Questions
            }
            WizardStep::Questions => {
                self.validate_questions().into_result(|| ())?;
                WizardStep::Review
            }
            WizardStep::Review => return Err(WizardError::NoNextStep),
        };
        Ok(self.step)
    }

    /// Go back one step. Stays on Details.
    pub fn back(&mut self) -> WizardStep {
        self.step = match self.step {
            WizardStep::Details | WizardStep::Questions => WizardStep::Details,
            WizardStep::Review => WizardStep::Questions,
        };
        self.step
    }

    /// Produce the activity payload.
    ///
    /// # Errors
    ///
    /// Returns `WrongStep` unless on Review, or `Invalid` if any step has
    /// become invalid.
    pub fn finish(self) -> Result<NewActivity, WizardError> {
        self.require_step(WizardStep::Review)?;
        let mut errors = self.validate_details();
        for error in self.validate_questions().errors() {
            errors.push(error.field, error.message.clone());
        }
        errors.into_result(|| ())?;

        Ok(NewActivity {
            title: self.title.trim().to_owned(),
            instructions: self.instructions.trim().to_owned(),
            kind: self.kind,
            questions: self.questions,
            due_date: self.due_date,
            tags: self.tags,
        })
    }

    fn validate_details(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::default();
        if self.title.trim().is_empty() {
            errors.push(Field::Title, "title is required");
        }
        if self.instructions.trim().is_empty() {
            errors.push(Field::Instructions, "instructions are required");
        }
        errors
    }

    fn validate_questions(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::default();
        if self.kind.requires_questions() && self.questions.is_empty() {
            errors.push(Field::Question(0), "add at least one question");
        }
        for (index, question) in self.questions.iter().enumerate() {
            if let Some(message) = question_problem(self.kind, question) {
                errors.push(Field::Question(index), message);
            }
        }
        errors
    }
}

/// The first thing wrong with `question`, if anything.
fn question_problem(kind: ActivityKind, question: &Question) -> Option<&'static str> {
    if question.prompt.trim().is_empty() {
        return Some("prompt is required");
    }
    if question.choices.len() < 2 {
        return Some("at least two choices are required");
    }
    if question.choices.iter().any(|c| c.trim().is_empty()) {
        return Some("choices cannot be blank");
    }
    let distinct: HashSet<&str> = question.choices.iter().map(|c| c.trim()).collect();
    if distinct.len() != question.choices.len() {
        return Some("choices must be different from each other");
    }
    // Surveys are unscored.
    if kind != ActivityKind::Survey {
        if question.answer_index >= question.choices.len() {
            return Some("answer must be one of the choices");
        }
        if question.points == 0 {
            return Some("points must be greater than zero");
        }
    }
    None
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ActivityId;

    fn question(prompt: &str) -> Question {
        Question {
            prompt: prompt.to_string(),
            choices: vec!["1/2".to_string(), "2/4".to_string(), "3/4".to_string()],
            answer_index: 2,
            points: 5,
        }
    }

    fn details_filled() -> ActivityWizard {
        let mut wizard = ActivityWizard::new(ActivityKind::Quiz);
        wizard.title = "Fractions Quiz".to_string();
        wizard.instructions = "Pick the largest fraction.".to_string();
        wizard
    }

    #[test]
    fn test_full_flow() {
        let mut wizard = details_filled();
        assert_eq!(wizard.next().unwrap(), WizardStep::Questions);
        assert_eq!(wizard.add_question(question("Which is largest?")).unwrap(), 0);
        assert_eq!(wizard.next().unwrap(), WizardStep::Review);

        let activity = wizard.finish().unwrap();
        assert_eq!(activity.title, "Fractions Quiz");
        assert_eq!(activity.questions.len(), 1);
    }

    #[test]
    fn test_details_must_be_valid_to_advance() {
        let mut wizard = ActivityWizard::new(ActivityKind::Quiz);
        let err = wizard.next().unwrap_err();
        let WizardError::Invalid(errors) = err else {
            panic!("expected validation errors");
        };
        assert_eq!(errors.errors().len(), 2);
        assert_eq!(wizard.step(), WizardStep::Details);
    }

    #[test]
    fn test_quiz_needs_questions() {
        let mut wizard = details_filled();
        wizard.next().unwrap();
        assert!(matches!(wizard.next(), Err(WizardError::Invalid(_))));
        assert_eq!(wizard.step(), WizardStep::Questions);
    }

    #[test]
    fn test_assignment_may_skip_questions() {
        let mut wizard = details_filled();
        wizard.kind = ActivityKind::Assignment;
        wizard.next().unwrap();
        assert_eq!(wizard.next().unwrap(), WizardStep::Review);
    }

    #[test]
    fn test_question_checks() {
        let mut wizard = details_filled();
        wizard.next().unwrap();
        let mut bad = question("Duplicate choices");
        bad.choices = vec!["A".to_string(), " A".to_string()];
        wizard.add_question(bad).unwrap();
        let mut out_of_range = question("Answer out of range");
        out_of_range.answer_index = 9;
        wizard.add_question(out_of_range).unwrap();

        let Err(WizardError::Invalid(errors)) = wizard.next() else {
            panic!("expected validation errors");
        };
        assert_eq!(
            errors.for_field(Field::Question(0)),
            Some("choices must be different from each other")
        );
        assert_eq!(
            errors.for_field(Field::Question(1)),
            Some("answer must be one of the choices")
        );
    }

    #[test]
    fn test_survey_questions_are_unscored() {
        let mut wizard = details_filled();
        wizard.kind = ActivityKind::Survey;
        wizard.next().unwrap();
        let mut q = question("How did you find the lesson?");
        q.points = 0;
        q.answer_index = 99;
        wizard.add_question(q).unwrap();
        assert_eq!(wizard.next().unwrap(), WizardStep::Review);
    }

    #[test]
    fn test_questions_only_editable_on_questions_step() {
        let mut wizard = details_filled();
        assert!(matches!(
            wizard.add_question(question("Too early")),
            Err(WizardError::WrongStep { .. })
        ));
        wizard.next().unwrap();
        wizard.add_question(question("Q1")).unwrap();
        assert_eq!(wizard.remove_question(3), Err(WizardError::NoSuchQuestion(3)));
        wizard.replace_question(0, question("Q1 revised")).unwrap();
        assert_eq!(wizard.questions()[0].prompt, "Q1 revised");
    }

    #[test]
    fn test_back_and_finish_guard() {
        let mut wizard = details_filled();
        wizard.next().unwrap();
        assert_eq!(wizard.back(), WizardStep::Details);
        assert_eq!(wizard.back(), WizardStep::Details);
        assert!(matches!(wizard.finish(), Err(WizardError::WrongStep { .. })));
    }

    #[test]
    fn test_from_activity_round_trips_fields() {
        let existing = Activity {
            id: ActivityId::new("12"),
            title: "Reading Log".to_string(),
            instructions: "Summarise chapter 3".to_string(),
            kind: ActivityKind::Assignment,
            questions: vec![],
            due_date: NaiveDate::from_ymd_opt(2026, 11, 2),
            tags: vec!["english".to_string()],
        };
        let mut wizard = ActivityWizard::from_activity(&existing);
        wizard.next().unwrap();
        wizard.next().unwrap();
        let payload = wizard.finish().unwrap();
        assert_eq!(payload.due_date, existing.due_date);
        assert_eq!(payload.tags, existing.tags);
    }
}
