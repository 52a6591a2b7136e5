//! Interactive portal session.
//!
//! Keeps one cookie jar and one session store alive across commands, so a
//! `login` followed by `visit` behaves the way a browser tab would.
//!
//! # Usage
//!
//! ```text
//! portal> login maria@example.com
//! password:
//! challenge token: 03AGdBq24...
//! portal> visit /class-masterlist
//! portal> edit-activity 12
//! ```
//!
//! Passwords are read from the terminal without echo. When input is piped
//! they are read as plain lines.

use std::io::{IsTerminal, Write};
use std::sync::Arc;

use school_portal_client::{
    AuthService, BackendClient, ChallengeToken, Navigator, PortalConfig, PortalError, SessionStore,
};
use school_portal_core::navigation::menu_for;
use school_portal_core::validation::{LoginForm, SignupForm};
use school_portal_core::wizard::{ActivityWizard, WizardError, WizardStep};
use school_portal_core::{
    Activity, ActivityId, ActivityKind, NewActivity, NewResource, Question, Resource, ResourceId,
    ResourceUpdate, SessionState,
};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::warn;

/// Errors from parsing a shell line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShellError {
    #[error("unknown command `{0}`, try `help`")]
    UnknownCommand(String),
    #[error("`{0}` needs an argument: {1}")]
    MissingArgument(&'static str, &'static str),
    #[error("`{0}` is not a question number")]
    BadQuestionNumber(String),
}

/// A parsed shell line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login(Option<String>),
    Signup,
    Logout,
    Visit(String),
    Whoami,
    Menu,
    Resources(Option<String>),
    Resource(String),
    Activities,
    Activity(String),
    NewActivity,
    EditActivity(String),
    NewResource,
    EditResource(String),
    Tags,
    Help,
    Quit,
    Empty,
}

const HELP: &str = "\
commands:
  login [email-or-lrn]   sign in
  signup                 create a learner account
  logout                 sign out
  visit <path>           navigate to a portal path
  whoami                 show the current session
  menu                   show the navigation menu
  resources [tag]        list resources
  resource <id>          show one resource
  new-resource           publish a resource
  edit-resource <id>     change a resource
  activities             list activities
  activity <id>          show one activity
  new-activity           build and publish an activity
  edit-activity <id>     revise an activity in the wizard
  tags                   list tags
  help                   this text
  quit                   leave the shell";

/// Parse one line of shell input.
///
/// # Errors
///
/// Returns `ShellError` for unknown commands or missing arguments.
pub fn parse_command(line: &str) -> Result<Command, ShellError> {
    let mut words = line.split_whitespace();
    let Some(name) = words.next() else {
        return Ok(Command::Empty);
    };
    let arg = words.next().map(str::to_string);

    let command = match name {
        "login" => Command::Login(arg),
        "signup" => Command::Signup,
        "logout" => Command::Logout,
        "visit" => Command::Visit(arg.ok_or(ShellError::MissingArgument("visit", "<path>"))?),
        "whoami" => Command::Whoami,
        "menu" => Command::Menu,
        "resources" => Command::Resources(arg),
        "resource" => Command::Resource(arg.ok_or(ShellError::MissingArgument("resource", "<id>"))?),
        "activities" => Command::Activities,
        "activity" => Command::Activity(arg.ok_or(ShellError::MissingArgument("activity", "<id>"))?),
        "new-activity" => Command::NewActivity,
        "edit-activity" => Command::EditActivity(
            arg.ok_or(ShellError::MissingArgument("edit-activity", "<id>"))?,
        ),
        "new-resource" => Command::NewResource,
        "edit-resource" => Command::EditResource(
            arg.ok_or(ShellError::MissingArgument("edit-resource", "<id>"))?,
        ),
        "tags" => Command::Tags,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(ShellError::UnknownCommand(other.to_string())),
    };
    Ok(command)
}

/// What a line typed on the questions step asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionAction {
    /// Start a new question with this prompt.
    Add(String),
    /// Rewrite the question at this index.
    Replace(usize),
    /// Drop the question at this index.
    Remove(usize),
    /// Show the questions so far.
    List,
    /// Return to the details step.
    Back,
    /// Leave the questions step.
    Done,
}

const QUESTIONS_HELP: &str = "\
type a question prompt to add it, or:
  list        show the questions so far
  replace N   rewrite question N
  remove N    drop question N
  back        return to the details
  (empty)     continue to review";

/// Parse one line typed on the questions step. Question numbers are 1-based.
///
/// # Errors
///
/// Returns `BadQuestionNumber` when `replace` or `remove` is not followed by
/// a positive number, `MissingArgument` when the number is absent.
pub fn parse_question_action(line: &str) -> Result<QuestionAction, ShellError> {
    let line = line.trim();
    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let number = |name: &'static str| {
        let rest = rest.trim();
        if rest.is_empty() {
            return Err(ShellError::MissingArgument(name, "<number>"));
        }
        match rest.parse::<usize>() {
            Ok(n) if n > 0 => Ok(n - 1),
            _ => Err(ShellError::BadQuestionNumber(rest.to_string())),
        }
    };

    let action = match word {
        "" => QuestionAction::Done,
        "back" if rest.is_empty() => QuestionAction::Back,
        "list" if rest.is_empty() => QuestionAction::List,
        "replace" => QuestionAction::Replace(number("replace")?),
        "remove" => QuestionAction::Remove(number("remove")?),
        _ => QuestionAction::Add(line.to_string()),
    };
    Ok(action)
}

/// Where secrets are read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SecretInput {
    /// Interactive terminal, read without echo.
    Hidden,
    /// Piped input, read as an ordinary line.
    Line,
}

impl SecretInput {
    const fn for_stdin(is_terminal: bool) -> Self {
        if is_terminal { Self::Hidden } else { Self::Line }
    }
}

struct Shell {
    config: PortalConfig,
    backend: BackendClient,
    auth: AuthService<BackendClient>,
    navigator: Navigator<BackendClient>,
    input: Lines<BufReader<Stdin>>,
}

/// Run the interactive shell until `quit` or end of input.
///
/// # Errors
///
/// Returns `PortalError` if the HTTP client cannot be created.
pub async fn run(config: PortalConfig) -> Result<(), PortalError> {
    let backend = BackendClient::new(&config)?;
    let store = Arc::new(SessionStore::new());
    let auth = AuthService::new(backend.clone(), store.clone(), config.challenge_ttl);
    let navigator = Navigator::new(backend.clone(), store);

    let mut shell = Shell {
        config,
        backend,
        auth,
        navigator,
        input: BufReader::new(tokio::io::stdin()).lines(),
    };
    shell.start().await;
    Ok(())
}

#[allow(clippy::print_stdout)]
impl Shell {
    async fn start(&mut self) {
        println!("School portal at {} (type `help`)", self.backend.base_url());
        self.visit("/").await;

        while let Some(line) = self.ask("portal> ").await {
            match parse_command(&line) {
                Ok(Command::Quit) => break,
                Ok(command) => self.execute(command).await,
                Err(error) => println!("{error}"),
            }
        }
    }

    /// Prompt and read one line. `None` at end of input.
    async fn ask(&mut self, prompt: &str) -> Option<String> {
        print!("{prompt}");
        let _ = std::io::stdout().flush();
        self.input.next_line().await.ok().flatten()
    }

    async fn ask_or_empty(&mut self, prompt: &str) -> String {
        self.ask(prompt).await.unwrap_or_default().trim().to_string()
    }

    /// Prompt with the current value as the default. An empty answer keeps it.
    async fn ask_default(&mut self, label: &str, current: &str) -> String {
        let answer = if current.is_empty() {
            self.ask_or_empty(&format!("{label}: ")).await
        } else {
            self.ask_or_empty(&format!("{label} [{current}]: ")).await
        };
        if answer.is_empty() {
            current.to_string()
        } else {
            answer
        }
    }

    /// Read a password. Surrounding whitespace is kept.
    async fn ask_secret(&mut self, prompt: &str) -> String {
        if SecretInput::for_stdin(std::io::stdin().is_terminal()) == SecretInput::Line {
            return self.ask(prompt).await.unwrap_or_default();
        }
        let label = prompt.to_string();
        match tokio::task::spawn_blocking(move || rpassword::prompt_password(label)).await {
            Ok(Ok(secret)) => secret,
            Ok(Err(error)) => {
                warn!(error = %error, "Hidden input unavailable, reading a plain line");
                self.ask(prompt).await.unwrap_or_default()
            }
            Err(error) => {
                warn!(error = %error, "Password prompt task failed");
                String::new()
            }
        }
    }

    async fn challenge(&mut self) -> ChallengeToken {
        if let Some(site_key) = &self.config.recaptcha_site_key {
            println!("solve the challenge for site key {site_key}");
        }
        ChallengeToken::new(self.ask_or_empty("challenge token: ").await)
    }

    async fn execute(&mut self, command: Command) {
        let result = match command {
            Command::Login(identifier) => self.login(identifier).await,
            Command::Signup => self.signup().await,
            Command::Logout => {
                let home = self.auth.logout().await;
                println!("signed out");
                self.visit(home).await;
                Ok(())
            }
            Command::Visit(path) => {
                self.visit(&path).await;
                Ok(())
            }
            Command::Whoami => {
                self.whoami();
                Ok(())
            }
            Command::Menu => {
                self.menu();
                Ok(())
            }
            Command::Resources(tag) => self.resources(tag.as_deref()).await,
            Command::Resource(id) => self.resource(&ResourceId::new(id)).await,
            Command::Activities => self.activities().await,
            Command::Activity(id) => self.activity(&ActivityId::new(id)).await,
            Command::NewActivity => self.new_activity().await,
            Command::EditActivity(id) => self.edit_activity(&ActivityId::new(id)).await,
            Command::NewResource => self.new_resource().await,
            Command::EditResource(id) => self.edit_resource(&ResourceId::new(id)).await,
            Command::Tags => self.tags().await,
            Command::Help => {
                println!("{HELP}");
                Ok(())
            }
            Command::Quit | Command::Empty => Ok(()),
        };
        if let Err(error) = result {
            print_error(&error);
        }
    }

    async fn login(&mut self, identifier: Option<String>) -> Result<(), PortalError> {
        let identifier = match identifier {
            Some(identifier) => identifier,
            None => self.ask_or_empty("email or LRN: ").await,
        };
        let password = self.ask_secret("password: ").await;
        let token = self.challenge().await;

        let form = LoginForm {
            identifier: &identifier,
            password: &password,
        };
        let success = self.auth.login(form, token).await?;
        if let Some(message) = &success.message {
            println!("{message}");
        }
        self.visit(&success.redirect).await;
        Ok(())
    }

    async fn signup(&mut self) -> Result<(), PortalError> {
        let first_name = self.ask_or_empty("first name: ").await;
        let last_name = self.ask_or_empty("last name: ").await;
        let lrn = self.ask_or_empty("LRN: ").await;
        let email = self.ask_or_empty("email: ").await;
        let password = self.ask_secret("password: ").await;
        let confirm_password = self.ask_secret("confirm password: ").await;
        let token = self.challenge().await;

        let form = SignupForm {
            first_name: &first_name,
            last_name: &last_name,
            lrn: &lrn,
            email: &email,
            password: &password,
            confirm_password: &confirm_password,
        };
        let success = self.auth.signup(form, token).await?;
        println!(
            "{}",
            success
                .message
                .as_deref()
                .unwrap_or("account created, check your email")
        );
        self.visit(&success.redirect).await;
        Ok(())
    }

    async fn visit(&mut self, path: &str) {
        match self.navigator.navigate(path).await {
            Ok(navigation) => {
                for redirect in &navigation.redirects {
                    println!("  {} -> {} ({:?})", redirect.from, redirect.to, redirect.reason);
                }
                println!("[{}]", navigation.path);
            }
            Err(error) => print_error(&error),
        }
    }

    fn whoami(&self) {
        match self.auth.session() {
            SessionState::Pending => println!("checking session..."),
            SessionState::Absent => println!("not signed in"),
            SessionState::Present(session) => {
                println!("{} <{}>", session.first_name, session.email);
                println!("  role:      {}", session.role);
                println!("  verified:  {}", session.is_email_verified);
                if let Some(status) = &session.enrollment_status {
                    println!("  enrolled:  {} {}", status.is_enrolled, status.enrollment_year);
                }
                if let Some(lrn) = &session.lrn {
                    println!("  LRN:       {lrn}");
                }
            }
        }
    }

    fn menu(&self) {
        match self.auth.session().session() {
            Some(session) => {
                for item in menu_for(session.role) {
                    println!("  {:<24}{}", item.label, item.path);
                }
            }
            None => println!("sign in to see a menu"),
        }
    }

    async fn resources(&self, tag: Option<&str>) -> Result<(), PortalError> {
        let resources = self.backend.list_resources(tag).await?;
        if resources.is_empty() {
            println!("no resources");
        }
        for resource in resources {
            println!("{:<8}{}  [{}]", resource.id, resource.title, resource.tags.join(", "));
        }
        Ok(())
    }

    async fn resource(&self, id: &ResourceId) -> Result<(), PortalError> {
        let resource = self.backend.get_resource(id).await?;
        println!("{}", resource.title);
        if !resource.description.is_empty() {
            println!("  {}", resource.description);
        }
        if let Some(grade) = &resource.grade_level {
            println!("  grade: {grade}");
        }
        if let Some(link) = &resource.link {
            println!("  link:  {link}");
        }
        println!("  tags:  {}", resource.tags.join(", "));
        Ok(())
    }

    async fn activities(&self) -> Result<(), PortalError> {
        let activities = self.backend.list_activities().await?;
        if activities.is_empty() {
            println!("no activities");
        }
        for activity in activities {
            println!("{:<8}{:?}  {}", activity.id, activity.kind, activity.title);
        }
        Ok(())
    }

    async fn activity(&self, id: &ActivityId) -> Result<(), PortalError> {
        let activity = self.backend.get_activity(id).await?;
        print_activity(&activity);
        Ok(())
    }

    async fn tags(&self) -> Result<(), PortalError> {
        for tag in self.backend.list_tags().await? {
            println!("{:<8}{}", tag.id, tag.name);
        }
        Ok(())
    }

    async fn new_resource(&mut self) -> Result<(), PortalError> {
        let resource = NewResource {
            title: self.ask_or_empty("title: ").await,
            description: self.ask_or_empty("description: ").await,
            tags: split_list(&self.ask_or_empty("tags (comma separated): ").await),
            grade_level: non_empty(self.ask_or_empty("grade level: ").await),
            link: non_empty(self.ask_or_empty("link: ").await),
        };
        let created = self.backend.create_resource(&resource).await?;
        println!("created resource {}", created.id);
        Ok(())
    }

    /// Ask for each field with the current value as default and send only
    /// what changed.
    async fn edit_resource(&mut self, id: &ResourceId) -> Result<(), PortalError> {
        let current = self.backend.get_resource(id).await?;
        let tags = current.tags.join(", ");
        let answers = ResourceAnswers {
            title: self.ask_default("title", &current.title).await,
            description: self.ask_default("description", &current.description).await,
            tags: self.ask_default("tags (comma separated)", &tags).await,
            grade_level: self
                .ask_default("grade level", current.grade_level.as_deref().unwrap_or_default())
                .await,
            link: self
                .ask_default("link", current.link.as_deref().unwrap_or_default())
                .await,
        };

        let update = answers.changes_from(&current);
        if update.is_empty() {
            println!("nothing changed");
            return Ok(());
        }
        let updated = self.backend.update_resource(id, &update).await?;
        println!("updated resource {}", updated.id);
        Ok(())
    }

    async fn new_activity(&mut self) -> Result<(), PortalError> {
        let kind = match self.ask_or_empty("kind (quiz/assignment/survey) [quiz]: ").await.as_str() {
            "assignment" => ActivityKind::Assignment,
            "survey" => ActivityKind::Survey,
            _ => ActivityKind::Quiz,
        };
        let Some(payload) = self.run_wizard(ActivityWizard::new(kind)).await? else {
            return Ok(());
        };
        let created = self.backend.create_activity(&payload).await?;
        println!("created activity {}", created.id);
        Ok(())
    }

    async fn edit_activity(&mut self, id: &ActivityId) -> Result<(), PortalError> {
        let activity = self.backend.get_activity(id).await?;
        let Some(payload) = self.run_wizard(ActivityWizard::from_activity(&activity)).await? else {
            return Ok(());
        };
        let updated = self.backend.update_activity(id, &payload).await?;
        println!("updated activity {}", updated.id);
        Ok(())
    }

    /// Walk the activity wizard from the prompt. `None` if the user gave up.
    async fn run_wizard(
        &mut self,
        mut wizard: ActivityWizard,
    ) -> Result<Option<NewActivity>, PortalError> {
        'steps: loop {
            match wizard.step() {
                WizardStep::Details => {
                    wizard.title = self.ask_default("title", &wizard.title).await;
                    wizard.instructions =
                        self.ask_default("instructions", &wizard.instructions).await;
                    let tags = wizard.tags.join(", ");
                    wizard.tags = split_list(&self.ask_default("tags (comma separated)", &tags).await);
                }
                WizardStep::Questions => {
                    println!("{QUESTIONS_HELP}");
                    print_questions(wizard.questions());
                    loop {
                        let line = self.ask_or_empty("question> ").await;
                        match parse_question_action(&line) {
                            Ok(QuestionAction::Done) => break,
                            Ok(QuestionAction::Back) => {
                                wizard.back();
                                continue 'steps;
                            }
                            Ok(QuestionAction::List) => print_questions(wizard.questions()),
                            Ok(QuestionAction::Add(prompt)) => {
                                let question = self.ask_question(prompt).await;
                                if let Err(error) = wizard.add_question(question) {
                                    println!("{error}");
                                }
                            }
                            Ok(QuestionAction::Replace(index)) => {
                                let Some(old) = wizard.questions().get(index) else {
                                    println!("{}", WizardError::NoSuchQuestion(index + 1));
                                    continue;
                                };
                                let old_prompt = old.prompt.clone();
                                let prompt = self.ask_default("  prompt", &old_prompt).await;
                                let question = self.ask_question(prompt).await;
                                if let Err(error) = wizard.replace_question(index, question) {
                                    println!("{error}");
                                }
                            }
                            Ok(QuestionAction::Remove(index)) => {
                                match wizard.remove_question(index) {
                                    Ok(removed) => println!("removed: {}", removed.prompt),
                                    Err(WizardError::NoSuchQuestion(_)) => {
                                        println!("{}", WizardError::NoSuchQuestion(index + 1));
                                    }
                                    Err(error) => println!("{error}"),
                                }
                            }
                            Err(error) => println!("{error}"),
                        }
                    }
                }
                WizardStep::Review => {
                    println!(
                        "{} ({:?}, {} questions)",
                        wizard.title,
                        wizard.kind,
                        wizard.questions().len()
                    );
                    match self.ask_or_empty("publish? [y/N/back] ").await.as_str() {
                        "y" => break,
                        "back" => {
                            wizard.back();
                            continue;
                        }
                        _ => {
                            println!("discarded");
                            return Ok(None);
                        }
                    }
                }
            }
            if let Err(error) = wizard.next() {
                println!("{error}");
                if self.ask_or_empty("try again? [Y/n] ").await == "n" {
                    return Ok(None);
                }
            }
        }

        match wizard.finish() {
            Ok(payload) => Ok(Some(payload)),
            Err(WizardError::Invalid(errors)) => Err(errors.into()),
            Err(other) => {
                println!("{other}");
                Ok(None)
            }
        }
    }

    async fn ask_question(&mut self, prompt: String) -> Question {
        let choices = split_list(&self.ask_or_empty("  choices (comma separated): ").await);
        let answer = self.ask_or_empty("  correct choice number: ").await;
        let points = self.ask_or_empty("  points [1]: ").await;
        Question {
            prompt,
            choices,
            answer_index: answer.parse::<usize>().unwrap_or(1).saturating_sub(1),
            points: points.parse().unwrap_or(1),
        }
    }
}

/// Answers from the `edit-resource` prompts.
#[derive(Debug, Clone, Default)]
struct ResourceAnswers {
    title: String,
    description: String,
    tags: String,
    grade_level: String,
    link: String,
}

impl ResourceAnswers {
    /// Fields that differ from `current`.
    fn changes_from(&self, current: &Resource) -> ResourceUpdate {
        let tags = split_list(&self.tags);
        ResourceUpdate {
            title: (self.title != current.title).then(|| self.title.clone()),
            description: (self.description != current.description)
                .then(|| self.description.clone()),
            tags: (tags != current.tags).then_some(tags),
            grade_level: non_empty(self.grade_level.clone())
                .filter(|grade| current.grade_level.as_ref() != Some(grade)),
            link: non_empty(self.link.clone()).filter(|link| current.link.as_ref() != Some(link)),
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[allow(clippy::print_stdout)]
fn print_questions(questions: &[Question]) {
    for (index, question) in questions.iter().enumerate() {
        println!("  {}. {} ({} choices)", index + 1, question.prompt, question.choices.len());
    }
}

#[allow(clippy::print_stdout)]
fn print_activity(activity: &Activity) {
    println!("{} ({:?})", activity.title, activity.kind);
    println!("  {}", activity.instructions);
    if let Some(due) = activity.due_date {
        println!("  due: {due}");
    }
    for (index, question) in activity.questions.iter().enumerate() {
        println!("  {}. {} ({} pts)", index + 1, question.prompt, question.points);
        for choice in &question.choices {
            println!("       - {choice}");
        }
    }
    if !activity.questions.is_empty() {
        println!("  total: {} pts", activity.total_points());
    }
}

#[allow(clippy::print_stdout)]
fn print_error(error: &PortalError) {
    match error {
        PortalError::Validation(errors) => {
            for field_error in errors.errors() {
                println!("  {}: {}", field_error.field, field_error.message);
            }
        }
        other => println!("error: {}", other.user_message()),
    }
}
