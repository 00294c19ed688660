//! Mode Controller
//!
//! A [`TutorSession`] owns the state of one tutoring conversation and maps each
//! parsed [`Command`] to exactly one spoken reply. The three modes form a small
//! state machine: `learn` explains, `quiz` asks and checks, `teach_back` has
//! the learner explain and grades the attempt. Only `SwitchMode` moves between
//! modes.

use crate::{
    Reply,
    command::{self, Command},
    config::{EndOfList, SessionOptions},
    content::{Concept, ContentStore},
    dialogue::Dialogue,
    error::{ContentError, TutorError},
    evaluator::{Evaluator, Grade, key_terms},
    formatter::{contains_markup, format_for_speech, truncate_sentences},
    persona::Persona,
    safety,
    session::{Mode, SessionState},
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What the tutor is waiting to hear next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    QuizAnswer,
    Explanation,
}

/// One tutoring conversation. Not shared between sessions.
pub struct TutorSession {
    store: Arc<ContentStore>,
    evaluator: Arc<dyn Evaluator>,
    options: SessionOptions,
    persona: Persona,
    state: SessionState,
    pending: Option<Pending>,
    last_response: String,
    ended: bool,
}

impl TutorSession {
    /// Starts a session with no active concept in the configured default mode.
    pub fn new(
        store: Arc<ContentStore>,
        evaluator: Arc<dyn Evaluator>,
        options: SessionOptions,
    ) -> Self {
        let persona = Persona::study_coach();
        let last_response = format_for_speech(&persona.greeting);
        info!(mode = %options.default_mode, concepts = store.len(), "Tutor session started");
        Self {
            store,
            evaluator,
            options,
            persona,
            state: SessionState::new(options.default_mode),
            pending: None,
            last_response,
            ended: false,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The most recent reply, or the greeting before the first turn.
    pub fn last_response(&self) -> &str {
        &self.last_response
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Runs one turn.
    ///
    /// # Errors
    ///
    /// Returns [`TutorError::SessionEnded`] once `Exit` has been handled.
    pub async fn handle(&mut self, command: Command) -> Result<Reply, TutorError> {
        if self.ended {
            return Err(TutorError::SessionEnded);
        }
        debug!(?command, mode = %self.state.active_mode, "Handling command");

        let raw = match command {
            Command::Repeat => return Ok(Reply::Speak(self.last_response.clone())),
            Command::Exit => return Ok(self.exit()),
            Command::ListConcepts => self.list_concepts(),
            Command::SelectConcept(query) => self.select_concept(&query),
            Command::SwitchMode(mode) => self.switch_mode(mode),
            Command::Next => self.next_concept(),
            Command::WeakestConcept => self.weakest_concept(),
            Command::FreeformUtterance(text) => self.freeform(&text).await,
        };

        let text = format_for_speech(&raw);
        debug_assert!(!text.is_empty() && !contains_markup(&text));
        self.last_response = text.clone();
        Ok(Reply::Speak(text))
    }

    fn exit(&mut self) -> Reply {
        self.ended = true;
        self.pending = None;
        self.last_response = format_for_speech(&self.persona.farewell);
        info!(
            practice_total = self.state.total_practice(),
            "Tutor session ended by user"
        );
        Reply::SessionComplete(self.last_response.clone())
    }

    /// One sentence naming every concept. Titles lose their own sentence
    /// breaks so the sentence cap never cuts the list short.
    fn list_concepts(&self) -> String {
        let names: Vec<String> = self
            .store
            .list()
            .into_iter()
            .map(|(id, title)| {
                let title = without_sentence_breaks(title);
                if title.eq_ignore_ascii_case(id) {
                    title
                } else {
                    format!("{}, concept {}", title, without_sentence_breaks(id))
                }
            })
            .collect();
        format!("We can study {}.", join_spoken(&names))
    }

    fn select_concept(&mut self, query: &str) -> String {
        let store = Arc::clone(&self.store);
        let found = store
            .resolve(query)
            .ok_or_else(|| ContentError::ConceptNotFound(query.to_string()));

        match found {
            Ok(concept) => {
                self.state.active_concept_id = Some(concept.id.clone());
                info!(concept = %concept.id, mode = %self.state.active_mode, "Concept selected");
                self.enter_mode(concept)
            }
            Err(e) => {
                debug!(error = %e, "Concept lookup failed");
                format!(
                    "I couldn't find a concept called {}, say list concepts to hear what's available.",
                    query
                )
            }
        }
    }

    fn switch_mode(&mut self, mode: Mode) -> String {
        let previous = self.state.active_mode;
        self.state.active_mode = mode;
        info!(from = %previous, to = %mode, "Mode switched");

        let store = Arc::clone(&self.store);
        match self.active_concept(&store) {
            Some(concept) => self.enter_mode(concept),
            None => {
                self.pending = None;
                format!(
                    "Okay, we're in {} mode now. Pick a concept first, say list concepts to hear them.",
                    mode.spoken()
                )
            }
        }
    }

    fn next_concept(&mut self) -> String {
        let store = Arc::clone(&self.store);
        let next = match &self.state.active_concept_id {
            None => store.first(),
            Some(id) => store.next_after(id, self.options.end_of_list),
        };

        match next {
            Some(concept) => {
                self.state.active_concept_id = Some(concept.id.clone());
                info!(concept = %concept.id, "Advanced to next concept");
                self.enter_mode(concept)
            }
            None => {
                debug_assert_eq!(self.options.end_of_list, EndOfList::Stop);
                "That was the last concept. Say list concepts to pick another, or ask what you're weakest at.".to_string()
            }
        }
    }

    fn weakest_concept(&self) -> String {
        let Some(concept) = self.state.weakest(&self.store) else {
            return "There's nothing to practice yet.".to_string();
        };

        if self.state.total_practice() == 0 {
            return format!(
                "You haven't practiced anything yet, {} is a good place to start. Say concept {} to begin.",
                concept.title, concept.id
            );
        }

        let count = match self.state.practice_count(&concept.id) {
            0 => "you haven't practiced it yet".to_string(),
            1 => "you've practiced it once".to_string(),
            n => format!("you've practiced it {} times", n),
        };
        format!(
            "Your weakest concept is {}, {}. Say concept {} to work on it.",
            concept.title, count, concept.id
        )
    }

    async fn freeform(&mut self, text: &str) -> String {
        if let Some(concern) = safety::screen(text) {
            warn!(?concern, "Declined out-of-scope request");
            return concern.decline(&self.persona.redirect);
        }

        let store = Arc::clone(&self.store);
        let Some(concept) = self.active_concept(&store) else {
            return "Let's pick a concept first, say list concepts to hear what's available.".to_string();
        };

        match (self.state.active_mode, self.pending) {
            (Mode::Learn, _) => concept.summary.clone(),
            (Mode::Quiz, Some(Pending::QuizAnswer)) => self.grade(concept, text).await,
            (Mode::TeachBack, Some(Pending::Explanation)) => self.grade(concept, text).await,
            (Mode::Quiz | Mode::TeachBack, _) => self.enter_mode(concept),
        }
    }

    /// Mode-entry response for `concept`; arms the pending prompt.
    fn enter_mode(&mut self, concept: &Concept) -> String {
        match self.state.active_mode {
            Mode::Learn => {
                self.pending = None;
                concept.summary.clone()
            }
            Mode::Quiz => {
                self.pending = Some(Pending::QuizAnswer);
                concept.sample_question.clone()
            }
            Mode::TeachBack => {
                self.pending = Some(Pending::Explanation);
                format!(
                    "Teach me {}. Explain it in your own words, as if I've never heard of it.",
                    concept.title
                )
            }
        }
    }

    async fn grade(&mut self, concept: &Concept, answer: &str) -> String {
        let grade = match self.evaluator.evaluate(concept, answer).await {
            Ok(grade) => grade,
            Err(e) => {
                warn!(error = ?e, concept = %concept.id, "Evaluator failed, asking for another attempt");
                return "I couldn't check that one, could you say it again?".to_string();
            }
        };

        let count = self.state.record_practice(&concept.id);
        self.pending = None;
        info!(
            concept = %concept.id,
            mode = %self.state.active_mode,
            ?grade,
            practice_count = count,
            "Practice recorded"
        );

        match self.state.active_mode {
            Mode::Quiz => quiz_feedback(grade, concept),
            _ => teach_back_feedback(grade, concept),
        }
    }

    /// The active concept, clearing a stale id if the store no longer has it.
    fn active_concept<'a>(&mut self, store: &'a ContentStore) -> Option<&'a Concept> {
        let id = self.state.active_concept_id.as_deref()?;
        match store.get(id) {
            Ok(concept) => Some(concept),
            Err(e) => {
                warn!(error = %e, "Active concept missing from store");
                self.state.active_concept_id = None;
                None
            }
        }
    }
}

fn quiz_feedback(grade: Grade, concept: &Concept) -> String {
    let key_idea = truncate_sentences(&concept.summary, 1);
    match grade {
        Grade::Great => "That's right, nice work. Say next to keep going.".to_string(),
        Grade::Good => format!("Partly right. The key idea is: {}", key_idea),
        Grade::TryAgain => format!("Not quite. Here's the key idea: {}", key_idea),
    }
}

fn teach_back_feedback(grade: Grade, concept: &Concept) -> String {
    match grade {
        Grade::Great => format!(
            "{}! You explained {} clearly. Say next to keep going.",
            grade.label(),
            concept.title
        ),
        Grade::Good => format!(
            "{}. Try covering how it works or giving an example.",
            grade.label()
        ),
        Grade::TryAgain => {
            let terms: Vec<String> = key_terms(&concept.summary).into_iter().take(3).collect();
            if terms.is_empty() {
                format!("{}.", grade.label())
            } else {
                format!("{}, like {}.", grade.label(), join_spoken(&terms))
            }
        }
    }
}

/// Drops `.`, `!` and `?` where they would end a sentence, keeping decimals
/// like "3.5" intact.
fn without_sentence_breaks(text: &str) -> String {
    let chars: Vec<char> = text.trim().chars().collect();
    chars
        .iter()
        .enumerate()
        .filter(|&(idx, c)| {
            !matches!(c, '.' | '!' | '?')
                || chars.get(idx + 1).is_some_and(|next| !next.is_whitespace())
        })
        .map(|(_, c)| *c)
        .collect()
}

/// Joins items as spoken English: "a", "a and b", "a, b, and c".
fn join_spoken(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [first, second] => format!("{} and {}", first, second),
        [init @ .., last] => format!("{}, and {}", init.join(", "), last),
    }
}

#[async_trait]
impl Dialogue for TutorSession {
    fn persona(&self) -> &Persona {
        &self.persona
    }

    async fn respond(&mut self, utterance: &str) -> Result<Reply, TutorError> {
        let command = match command::parse(utterance) {
            // While an answer is pending, "study hard" or "concept of inertia"
            // is the answer unless it names a concept outright.
            Command::SelectConcept(query)
                if self.pending.is_some() && self.store.resolve_exact(&query).is_none() =>
            {
                debug!(%query, "Treating select phrase as an answer");
                Command::FreeformUtterance(utterance.trim().to_string())
            }
            other => other,
        };
        self.handle(command).await
    }

    fn snapshot(&self) -> serde_json::Value {
        serde_json::to_value(&self.state).unwrap_or_default()
    }

    fn is_finished(&self) -> bool {
        self.ended
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::{KeywordOverlapEvaluator, MockEvaluator};

    fn store() -> Arc<ContentStore> {
        Arc::new(
            ContentStore::from_concepts(vec![
                Concept {
                    id: "c1".to_string(),
                    title: "Newton's First Law".to_string(),
                    summary: "An object stays at rest or keeps moving unless a force acts on it. This is called inertia.".to_string(),
                    sample_question: "What keeps an object at rest at rest?".to_string(),
                },
                Concept {
                    id: "c2".to_string(),
                    title: "Kinetic Energy".to_string(),
                    summary: "Kinetic energy is the energy of motion.".to_string(),
                    sample_question: "What kind of energy does a rolling ball have?".to_string(),
                },
            ])
            .unwrap(),
        )
    }

    fn session_with(evaluator: impl Evaluator + 'static, options: SessionOptions) -> TutorSession {
        TutorSession::new(store(), Arc::new(evaluator), options)
    }

    fn session() -> TutorSession {
        session_with(KeywordOverlapEvaluator::default(), SessionOptions::default())
    }

    async fn say(session: &mut TutorSession, command: Command) -> String {
        session.handle(command).await.unwrap().text().to_string()
    }

    #[tokio::test]
    async fn test_new_session_defaults() {
        let session = session();
        assert_eq!(session.state().active_concept_id, None);
        assert_eq!(session.state().active_mode, Mode::Learn);
        assert!(session.last_response().starts_with("Hi, I'm your study coach."));
    }

    #[tokio::test]
    async fn test_list_concepts_is_one_sentence() {
        let mut session = session();
        let text = say(&mut session, Command::ListConcepts).await;
        assert_eq!(
            text,
            "We can study Newton's First Law, concept c one and Kinetic Energy, concept c two."
        );
    }

    #[tokio::test]
    async fn test_list_keeps_every_punctuated_title() {
        let concept = |id: &str, title: &str| Concept {
            id: id.to_string(),
            title: title.to_string(),
            summary: "Light scatters.".to_string(),
            sample_question: "Why?".to_string(),
        };
        let store = ContentStore::from_concepts(vec![
            concept("a", "Why Is the Sky Blue?"),
            concept("b", "What Is Heat?"),
            concept("c", "What Is Light?"),
            concept("d", "What Is Sound?"),
            concept("e", "Dr. Seuss and 3.5 Rhymes!"),
        ])
        .unwrap();
        let mut session = TutorSession::new(
            Arc::new(store),
            Arc::new(KeywordOverlapEvaluator::default()),
            SessionOptions::default(),
        );

        let text = say(&mut session, Command::ListConcepts).await;
        for id in ["concept a", "concept b", "concept c", "concept d", "concept e"] {
            assert!(text.contains(id), "{id} missing from: {text}");
        }
        assert!(text.contains("What Is Sound, concept d"));
        assert!(text.contains("three point five Rhymes"));
        assert_eq!(text.matches(['.', '!', '?']).count(), 1);
        assert!(!text.contains('('));
    }

    #[test]
    fn test_without_sentence_breaks() {
        assert_eq!(without_sentence_breaks("What Is Heat?"), "What Is Heat");
        assert_eq!(without_sentence_breaks("Mr. Newton! Wow."), "Mr Newton Wow");
        assert_eq!(without_sentence_breaks("Version 2.0"), "Version 2.0");
    }

    #[tokio::test]
    async fn test_learn_mode_emits_summary() {
        let mut session = session();
        let text = say(&mut session, Command::SelectConcept("c1".into())).await;
        assert_eq!(
            text,
            "An object stays at rest or keeps moving unless a force acts on it. This is called inertia."
        );
        let again = say(&mut session, Command::FreeformUtterance("tell me more".into())).await;
        assert_eq!(again, text);
    }

    #[tokio::test]
    async fn test_unknown_concept_offers_list() {
        let mut session = session();
        let text = say(&mut session, Command::SelectConcept("photosynthesis".into())).await;
        assert_eq!(
            text,
            "I couldn't find a concept called photosynthesis, say list concepts to hear what's available."
        );
        assert_eq!(session.state().active_concept_id, None);
    }

    #[tokio::test]
    async fn test_quiz_flow_counts_practice() {
        let mut evaluator = MockEvaluator::new();
        evaluator
            .expect_evaluate()
            .withf(|concept, answer| concept.id == "c1" && answer == "inertia")
            .times(1)
            .returning(|_, _| Ok(Grade::Great));
        let mut session = session_with(evaluator, SessionOptions::default());

        let text = say(&mut session, Command::SwitchMode(Mode::Quiz)).await;
        assert!(text.contains("Pick a concept first"));

        let question = say(&mut session, Command::SelectConcept("c1".into())).await;
        assert_eq!(question, "What keeps an object at rest at rest?");
        assert_eq!(session.state().practice_count("c1"), 0);

        let feedback = say(&mut session, Command::FreeformUtterance("inertia".into())).await;
        assert_eq!(feedback, "That's right, nice work. Say next to keep going.");
        assert_eq!(session.state().practice_count("c1"), 1);

        let asked_again = say(&mut session, Command::FreeformUtterance("ok".into())).await;
        assert_eq!(asked_again, question);
    }

    #[tokio::test]
    async fn test_quiz_feedback_includes_key_idea() {
        let mut evaluator = MockEvaluator::new();
        evaluator
            .expect_evaluate()
            .returning(|_, _| Ok(Grade::TryAgain));
        let mut session = session_with(evaluator, SessionOptions::default());

        say(&mut session, Command::SelectConcept("c1".into())).await;
        say(&mut session, Command::SwitchMode(Mode::Quiz)).await;
        let feedback = say(&mut session, Command::FreeformUtterance("gravity".into())).await;
        assert_eq!(
            feedback,
            "Not quite. Here's the key idea: An object stays at rest or keeps moving unless a force acts on it."
        );
    }

    #[tokio::test]
    async fn test_teach_back_grades_explanation() {
        let mut session = session();
        say(&mut session, Command::SelectConcept("c1".into())).await;

        let prompt = say(&mut session, Command::SwitchMode(Mode::TeachBack)).await;
        assert_eq!(
            prompt,
            "Teach me Newton's First Law. Explain it in your own words, as if I've never heard of it."
        );

        let feedback = say(&mut session, Command::FreeformUtterance("Gravity pulls things down.".into())).await;
        assert_eq!(
            feedback,
            "Try again, focus on key terms, like object, stay, and rest."
        );
        assert_eq!(session.state().practice_count("c1"), 1);

        // A fresh prompt is armed before the next attempt is graded.
        let reprompt = say(&mut session, Command::FreeformUtterance("hmm".into())).await;
        assert_eq!(reprompt, prompt);

        let feedback = say(
            &mut session,
            Command::FreeformUtterance(
                "Inertia means an object stays at rest or keeps moving until a force acts on it, that's what it's called.".into(),
            ),
        )
        .await;
        assert_eq!(
            feedback,
            "Great! You explained Newton's First Law clearly. Say next to keep going."
        );
        assert_eq!(session.state().practice_count("c1"), 2);
    }

    #[tokio::test]
    async fn test_evaluator_failure_is_recovered() {
        let mut evaluator = MockEvaluator::new();
        evaluator
            .expect_evaluate()
            .returning(|_, _| Err(anyhow::anyhow!("grader offline")));
        let mut session = session_with(evaluator, SessionOptions::default());

        say(&mut session, Command::SelectConcept("c2".into())).await;
        say(&mut session, Command::SwitchMode(Mode::TeachBack)).await;
        let text = say(&mut session, Command::FreeformUtterance("energy of motion".into())).await;
        assert_eq!(text, "I couldn't check that one, could you say it again?");
        assert_eq!(session.state().practice_count("c2"), 0);
    }

    #[tokio::test]
    async fn test_next_wraps_by_default() {
        let mut session = session();
        say(&mut session, Command::Next).await;
        assert_eq!(session.state().active_concept_id.as_deref(), Some("c1"));
        say(&mut session, Command::Next).await;
        assert_eq!(session.state().active_concept_id.as_deref(), Some("c2"));
        say(&mut session, Command::Next).await;
        assert_eq!(session.state().active_concept_id.as_deref(), Some("c1"));
    }

    #[tokio::test]
    async fn test_next_can_stop_at_end() {
        let options = SessionOptions {
            end_of_list: EndOfList::Stop,
            ..SessionOptions::default()
        };
        let mut session = session_with(KeywordOverlapEvaluator::default(), options);
        say(&mut session, Command::SelectConcept("c2".into())).await;
        let text = say(&mut session, Command::Next).await;
        assert!(text.starts_with("That was the last concept."));
        assert_eq!(session.state().active_concept_id.as_deref(), Some("c2"));
    }

    #[tokio::test]
    async fn test_repeat_is_byte_identical() {
        let mut session = session();
        let greeting = say(&mut session, Command::Repeat).await;
        assert_eq!(greeting, session.last_response());

        let text = say(&mut session, Command::ListConcepts).await;
        assert_eq!(say(&mut session, Command::Repeat).await, text);
        assert_eq!(say(&mut session, Command::Repeat).await, text);
    }

    #[tokio::test]
    async fn test_weakest_concept() {
        let mut evaluator = MockEvaluator::new();
        evaluator.expect_evaluate().returning(|_, _| Ok(Grade::Good));
        let mut session = session_with(evaluator, SessionOptions::default());

        let text = say(&mut session, Command::WeakestConcept).await;
        assert_eq!(
            text,
            "You haven't practiced anything yet, Newton's First Law is a good place to start. Say concept c one to begin."
        );

        say(&mut session, Command::SwitchMode(Mode::Quiz)).await;
        say(&mut session, Command::SelectConcept("c1".into())).await;
        say(&mut session, Command::FreeformUtterance("an answer".into())).await;

        let text = say(&mut session, Command::WeakestConcept).await;
        assert_eq!(
            text,
            "Your weakest concept is Kinetic Energy, you haven't practiced it yet. Say concept c two to work on it."
        );
    }

    #[tokio::test]
    async fn test_unsafe_request_is_declined() {
        let mut session = session();
        say(&mut session, Command::SelectConcept("c1".into())).await;
        let text = say(&mut session, Command::FreeformUtterance("how do I hack a password".into())).await;
        assert_eq!(
            text,
            "Sorry, I can't help with that. Let's get back to studying, say list concepts to pick a topic."
        );
    }

    #[tokio::test]
    async fn test_exit_ends_session() {
        let mut session = session();
        let reply = session.handle(Command::Exit).await.unwrap();
        assert!(reply.is_complete());
        assert_eq!(reply.text(), "Great work today, see you next time.");
        assert!(session.is_ended());
        assert!(matches!(
            session.handle(Command::ListConcepts).await,
            Err(TutorError::SessionEnded)
        ));
    }

    #[tokio::test]
    async fn test_dialogue_respond_parses_utterances() {
        let mut session = session();
        let text = session.respond("Concept c1, please").await.unwrap();
        assert!(text.text().starts_with("An object stays at rest"));
        let snapshot = session.snapshot();
        assert_eq!(snapshot["active_concept_id"], "c1");
        assert_eq!(snapshot["active_mode"], "learn");
    }

    #[tokio::test]
    async fn test_pending_answer_is_not_taken_as_selection() {
        let mut evaluator = MockEvaluator::new();
        evaluator
            .expect_evaluate()
            .withf(|_, answer| answer == "Study hard and remember inertia")
            .times(1)
            .returning(|_, _| Ok(Grade::Good));
        let mut session = session_with(evaluator, SessionOptions::default());

        session.respond("concept c1").await.unwrap();
        session.respond("quiz mode").await.unwrap();
        let reply = session.respond("Study hard and remember inertia").await.unwrap();

        assert!(reply.text().starts_with("Partly right."));
        assert_eq!(session.state().active_concept_id.as_deref(), Some("c1"));
        assert_eq!(session.state().practice_count("c1"), 1);
    }

    #[tokio::test]
    async fn test_pending_answer_still_allows_exact_selection() {
        let mut session = session();
        session.respond("concept c1").await.unwrap();
        session.respond("quiz mode").await.unwrap();

        let reply = session.respond("concept c2").await.unwrap();
        assert_eq!(reply.text(), "What kind of energy does a rolling ball have?");
        assert_eq!(session.state().active_concept_id.as_deref(), Some("c2"));
        assert_eq!(session.state().practice_count("c1"), 0);
    }

    #[test]
    fn test_join_spoken() {
        let items = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(join_spoken(&items(&["a"])), "a");
        assert_eq!(join_spoken(&items(&["a", "b"])), "a and b");
        assert_eq!(join_spoken(&items(&["a", "b", "c"])), "a, b, and c");
    }
}
