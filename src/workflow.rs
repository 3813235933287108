// Interactive workflow.
//
// The run is a loop over `State`: log in, show the course menu, then either
// submit one piece of coursework or sweep every course in bulk. Login
// failure and explicit logout both clear the saved credentials and go back
// to asking for them; everything that returns "to the menu" re-enters
// `State::ShowingCourses`, which fetches the course list afresh.

use std::time::Duration;

use crate::api::{ApiClient, Course, Coursework, MAX_GRADE};
use crate::config::ConfigStore;
use crate::error::WorkflowError;
use crate::transport::Transport;
use crate::ui::{Console, Pacer};

/// Pause after freshly typed settings are saved.
const SAVE_PAUSE: Duration = Duration::from_secs(1);

/// Pause before starting over after logout or a failed login.
const RESTART_PAUSE: Duration = Duration::from_secs(2);

/// Bulk pacing used when the operator's answer is not a number.
pub const DEFAULT_PACING_SECS: u64 = 60;

/// Course menu choice that logs out.
const LOGOUT: i64 = 0;

/// Course menu choice that submits everything.
const SUBMIT_ALL: i64 = -1;

/// Work menu choice that returns to the course list.
const BACK: i64 = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    NeedCredentials,
    Authenticating { account: String, password: String },
    LoginFailed,
    Authenticated,
    ShowingCourses,
    SingleCourse(i64),
    Submitting(i64),
    Bulk,
    AfterSubmit,
    Done,
}

/// Drives the platform client from operator input.
pub struct Workflow<T, C, S, P> {
    client: ApiClient<T>,
    console: C,
    store: S,
    pacer: P,
    courses: Vec<Course>,
}

impl<T, C, S, P> Workflow<T, C, S, P>
where
    T: Transport,
    C: Console,
    S: ConfigStore,
    P: Pacer,
{
    pub fn new(client: ApiClient<T>, console: C, store: S, pacer: P) -> Self {
        Self {
            client,
            console,
            store,
            pacer,
            courses: Vec::new(),
        }
    }

    /// Run until the operator exits or a fatal error occurs.
    pub fn run(&mut self) -> Result<(), WorkflowError> {
        let mut state = State::NeedCredentials;
        while state != State::Done {
            tracing::info!(state = ?StateName(&state), "entering state");
            state = self.step(state)?;
        }
        Ok(())
    }

    fn step(&mut self, state: State) -> Result<State, WorkflowError> {
        match state {
            State::NeedCredentials => self.obtain_credentials(),
            State::Authenticating { account, password } => {
                match self.client.authenticate(&account, &password) {
                    Ok(()) => Ok(State::Authenticated),
                    Err(e) => {
                        self.console.say(&format!("Login failed: {e}"));
                        Ok(State::LoginFailed)
                    }
                }
            }
            State::LoginFailed => {
                self.console.say("Please log in again");
                self.logout();
                self.pacer.sleep(RESTART_PAUSE);
                Ok(State::NeedCredentials)
            }
            State::Authenticated => {
                let profile = self
                    .client
                    .profile()
                    .map_err(|e| WorkflowError::api("failed to fetch user profile", e))?;
                self.console.say(&format!(
                    "Logged in. Hello, {} (student no. {})\n",
                    profile.name, profile.student_no
                ));
                Ok(State::ShowingCourses)
            }
            State::ShowingCourses => self.course_menu(),
            State::SingleCourse(course_id) => self.work_menu(course_id),
            State::Submitting(work_id) => {
                match self.client.submit(work_id, MAX_GRADE) {
                    Ok(()) => self.console.say("\nSubmitted!"),
                    Err(e) => self
                        .console
                        .say(&format!("Submission of work [{work_id}] failed: {e}")),
                }
                Ok(State::AfterSubmit)
            }
            State::Bulk => {
                self.submit_all()?;
                Ok(State::AfterSubmit)
            }
            State::AfterSubmit => {
                self.console
                    .say("Press Enter to return to the course list, 0 to exit...");
                if self.console.read_key()? == Some('0') {
                    Ok(State::Done)
                } else {
                    self.console.clear();
                    Ok(State::ShowingCourses)
                }
            }
            State::Done => Ok(State::Done),
        }
    }

    fn obtain_credentials(&mut self) -> Result<State, WorkflowError> {
        let settings = self.store.load_or_default();
        if let Some((account, password)) = settings.credentials() {
            self.console.say("Loaded account from config file");
            return Ok(State::Authenticating {
                account: account.to_string(),
                password: password.to_string(),
            });
        }

        let account = self.console.read_line("Account")?.trim().to_string();
        let password = self.console.read_secret("Password")?;
        self.console.clear();
        match self.store.save_credentials(&account, &password) {
            Ok(()) => self.console.say("Account saved to config file"),
            Err(e) => self.console.say(&format!("Failed to save config file: {e}")),
        }
        self.pacer.sleep(SAVE_PAUSE);
        Ok(State::Authenticating { account, password })
    }

    fn course_menu(&mut self) -> Result<State, WorkflowError> {
        self.courses = self
            .client
            .courses()
            .map_err(|e| WorkflowError::api("failed to fetch courses", e))?;

        self.console.say("Your courses:");
        for course in &self.courses {
            self.console.say(&format!("{} [{}]", course.name, course.id));
        }
        self.console
            .say("\nSubmit all coursework of all courses [-1]\nLog out [0]\n");

        match self.read_number("Course ID")? {
            LOGOUT => {
                self.logout();
                self.console.say("Logged out");
                self.pacer.sleep(RESTART_PAUSE);
                self.console.clear();
                Ok(State::NeedCredentials)
            }
            SUBMIT_ALL => Ok(State::Bulk),
            course_id => Ok(State::SingleCourse(course_id)),
        }
    }

    fn work_menu(&mut self, course_id: i64) -> Result<State, WorkflowError> {
        let works = self.client.coursework(course_id).map_err(|e| {
            WorkflowError::api(format!("failed to fetch coursework of course [{course_id}]"), e)
        })?;

        self.console.say("\nCoursework:");
        for work in &works {
            self.console.say(&format!("{} [{}]", work.name, work.id));
        }
        self.console.say("\nBack to course list [0]\n");

        match self.read_number("Work ID")? {
            BACK => {
                self.console.clear();
                Ok(State::ShowingCourses)
            }
            work_id => Ok(State::Submitting(work_id)),
        }
    }

    /// Submit every piece of coursework of every listed course, waiting the
    /// pacing delay after each submission. Failures are reported and skipped.
    fn submit_all(&mut self) -> Result<(), WorkflowError> {
        self.console
            .say("\nSubmitting all coursework of all courses...");
        let delay = Duration::from_secs(self.resolve_pacing()?);
        self.console.say(&format!(
            "Waiting {}s after each submission",
            delay.as_secs()
        ));

        let courses = self.courses.clone();
        for course in &courses {
            self.console
                .say(&format!("\nProcessing course: {} [{}]", course.name, course.id));
            let works = match self.client.coursework(course.id) {
                Ok(works) => works,
                Err(e) => {
                    tracing::warn!(course_id = course.id, error = %e, "skipping course");
                    self.console.say(&format!(
                        "Failed to fetch coursework of course [{}]: {e}",
                        course.id
                    ));
                    continue;
                }
            };
            for work in &works {
                self.submit_paced(work, delay);
            }
        }

        self.console.say("\nAll coursework submitted!");
        Ok(())
    }

    fn submit_paced(&mut self, work: &Coursework, delay: Duration) {
        let outcome = match self.client.submit(work.id, MAX_GRADE) {
            Ok(()) => "ok".to_string(),
            Err(e) => {
                tracing::warn!(work_id = work.id, error = %e, "submission failed");
                format!("failed: {e}")
            }
        };
        self.console
            .say(&format!("  Submitting {} [{}]... {outcome}", work.name, work.id));
        self.pacer.pace(delay);
    }

    fn resolve_pacing(&mut self) -> Result<u64, WorkflowError> {
        if let Some(seconds) = self.store.load_or_default().pacing() {
            return Ok(seconds);
        }

        let answer = self.console.read_line(&format!(
            "Delay between submissions (seconds, default {DEFAULT_PACING_SECS})"
        ))?;
        let seconds = answer.trim().parse().unwrap_or(DEFAULT_PACING_SECS);
        match self.store.save_pacing(seconds) {
            Ok(()) => self.console.say("Delay saved to config file"),
            Err(e) => self.console.say(&format!("Failed to save config file: {e}")),
        }
        self.pacer.sleep(SAVE_PAUSE);
        Ok(seconds)
    }

    /// Forget the session and the saved credentials.
    fn logout(&mut self) {
        self.client.logout();
        self.courses.clear();
        if let Err(e) = self.store.clear_credentials() {
            self.console.say(&format!("Logout failed: {e}"));
        }
    }

    fn read_number(&mut self, prompt: &str) -> Result<i64, WorkflowError> {
        let input = self.console.read_line(prompt)?;
        input
            .trim()
            .parse()
            .map_err(|_| WorkflowError::InvalidSelection { input })
    }
}

// Keeps the password out of the state log.
struct StateName<'a>(&'a State);

impl std::fmt::Debug for StateName<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            State::Authenticating { account, .. } => write!(f, "Authenticating({account})"),
            other => write!(f, "{other:?}"),
        }
    }
}
