// API client module: a small blocking client for the coursework platform.
// It owns the session token and turns raw responses into the records the
// workflow renders. Every call is one synchronous round trip.

use serde::Deserialize;

use crate::decode::{self, DATA};
use crate::error::ApiError;
use crate::transport::{Endpoint, Form, HttpTransport, Transport};

/// Score sent with every submission. Always full marks.
pub const MAX_GRADE: u32 = 100;

/// The authenticated account as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub name: String,
    pub student_no: String,
}

/// One enrolled course. Field names mirror the platform's JSON.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Course {
    #[serde(rename = "courseId", deserialize_with = "decode::numeric_id")]
    pub id: i64,
    #[serde(rename = "courseName")]
    pub name: String,
}

/// One submittable piece of coursework within a course.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Coursework {
    #[serde(rename = "workId", deserialize_with = "decode::numeric_id")]
    pub id: i64,
    #[serde(rename = "workName")]
    pub name: String,
}

/// Holds the bearer token handed out by the login endpoint.
#[derive(Debug, Default, Clone)]
pub struct Session {
    token: Option<String>,
}

impl Session {
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn set(&mut self, token: String) {
        self.token = Some(token);
    }

    pub fn clear(&mut self) {
        self.token = None;
    }
}

/// Platform client composed of a transport and the session it authenticates.
pub struct ApiClient<T = HttpTransport> {
    transport: T,
    session: Session,
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T) -> Self {
        ApiClient {
            transport,
            session: Session::default(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Drop the in-memory token. Later calls go out unauthenticated.
    pub fn logout(&mut self) {
        self.session.clear();
    }

    /// Log in and keep the returned token. The session is left untouched
    /// when anything about the exchange fails.
    pub fn authenticate(&mut self, account: &str, password: &str) -> Result<(), ApiError> {
        let form: Form = vec![
            ("loginName", account.to_string()),
            ("password", password.to_string()),
        ];
        let body = self.transport.post(Endpoint::Login, Some(&form), None)?;
        let token = decode::expect_str(decode::field(&body, DATA)?, "authorization value")?;
        tracing::info!("authenticated");
        self.session.set(token);
        Ok(())
    }

    pub fn profile(&self) -> Result<Profile, ApiError> {
        let body = self.authed(Endpoint::Profile, None)?;
        let mut data = decode::expect_object(decode::field(&body, DATA)?, DATA)?;
        Ok(Profile {
            name: decode::required_str(&mut data, "userName")?,
            student_no: decode::required_str(&mut data, "studentNo")?,
        })
    }

    /// Enrolled courses in platform order. Malformed entries are skipped.
    pub fn courses(&self) -> Result<Vec<Course>, ApiError> {
        let body = self.authed(Endpoint::Courses, None)?;
        let items = decode::expect_array(decode::field(&body, DATA)?, DATA)?;
        Ok(decode::lenient_list(items))
    }

    /// Coursework of one course in platform order. Malformed entries are skipped.
    pub fn coursework(&self, course_id: i64) -> Result<Vec<Coursework>, ApiError> {
        let form: Form = vec![("courseId", course_id.to_string())];
        let body = self.authed(Endpoint::Coursework, Some(&form))?;
        let items = decode::expect_array(decode::field(&body, DATA)?, DATA)?;
        Ok(decode::lenient_list(items))
    }

    /// Submit `grade` for a piece of coursework. Only the status is checked.
    pub fn submit(&self, work_id: i64, grade: u32) -> Result<(), ApiError> {
        let form: Form = vec![("workId", work_id.to_string()), ("grade", grade.to_string())];
        self.authed(Endpoint::Submit, Some(&form))?;
        Ok(())
    }

    // An empty token is no token: the header is left off.
    fn authed(&self, endpoint: Endpoint, form: Option<&Form>) -> Result<Vec<u8>, ApiError> {
        let token = self.session.token().filter(|t| !t.is_empty());
        self.transport.post(endpoint, form, token)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedTransport;
    use super::*;

    fn logged_in(transport: ScriptedTransport) -> ApiClient<ScriptedTransport> {
        let mut client = ApiClient::new(transport.reply(Endpoint::Login, r#"{"data":"tok123"}"#));
        client.authenticate("alice", "secret").unwrap();
        client
    }

    #[test]
    fn authenticate_stores_token_verbatim() {
        let client = logged_in(ScriptedTransport::new());
        assert_eq!(client.session().token(), Some("tok123"));

        let calls = client.transport().calls_to(Endpoint::Login);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].token, None);
        assert_eq!(
            calls[0].form,
            Some(vec![
                ("loginName", "alice".to_string()),
                ("password", "secret".to_string())
            ])
        );
    }

    #[test]
    fn authenticate_rejects_non_string_token() {
        for body in [r#"{"data":42}"#, r#"{"data":{"t":"x"}}"#, r#"{"data":null}"#] {
            let mut client = ApiClient::new(ScriptedTransport::new().reply(Endpoint::Login, body));
            let err = client.authenticate("a", "b").unwrap_err();
            assert!(matches!(err, ApiError::Shape { .. }), "{body}: {err}");
            assert!(client.session().token().is_none());
        }
    }

    #[test]
    fn failed_relogin_keeps_previous_token() {
        let mut client =
            ApiClient::new(ScriptedTransport::new().reply(Endpoint::Login, r#"{"msg":"bad"}"#));
        client.session.set("tok123".into());
        let err = client.authenticate("a", "b").unwrap_err();
        assert!(matches!(err, ApiError::FieldMissing(_)));
        assert_eq!(client.session().token(), Some("tok123"));
    }

    #[test]
    fn authenticate_surfaces_http_status() {
        let mut client = ApiClient::new(ScriptedTransport::new().fail(Endpoint::Login, 401));
        let err = client.authenticate("a", "b").unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert!(client.session().token().is_none());
    }

    #[test]
    fn profile_is_read_with_token() {
        let client = logged_in(ScriptedTransport::new().reply(
            Endpoint::Profile,
            r#"{"data":{"userName":"Alice","studentNo":"S001"}}"#,
        ));
        let profile = client.profile().unwrap();
        assert_eq!(profile.name, "Alice");
        assert_eq!(profile.student_no, "S001");
        let calls = client.transport().calls_to(Endpoint::Profile);
        assert_eq!(calls[0].token.as_deref(), Some("tok123"));
        assert_eq!(calls[0].form, None);
    }

    #[test]
    fn profile_missing_student_no_names_the_field() {
        let client = logged_in(
            ScriptedTransport::new().reply(Endpoint::Profile, r#"{"data":{"userName":"Alice"}}"#),
        );
        let err = client.profile().unwrap_err();
        assert!(matches!(err, ApiError::FieldMissing(ref k) if k == "studentNo"));
    }

    #[test]
    fn courses_skip_malformed_entries() {
        let client = logged_in(ScriptedTransport::new().reply(
            Endpoint::Courses,
            r#"{"data":[
                {"courseId":5,"courseName":"Algebra"},
                {"courseId":"6","courseName":"Broken"},
                {"courseId":7,"courseName":"Physics","room":"B2"}
            ]}"#,
        ));
        let courses = client.courses().unwrap();
        assert_eq!(
            courses,
            vec![
                Course { id: 5, name: "Algebra".into() },
                Course { id: 7, name: "Physics".into() },
            ]
        );
    }

    #[test]
    fn courses_accept_float_encoded_ids() {
        let client = logged_in(ScriptedTransport::new().reply(
            Endpoint::Courses,
            r#"{"data":[{"courseId":5.0,"courseName":"Algebra"}]}"#,
        ));
        assert_eq!(
            client.courses().unwrap(),
            vec![Course { id: 5, name: "Algebra".into() }]
        );
    }

    #[test]
    fn empty_token_is_not_sent() {
        let mut client = ApiClient::new(
            ScriptedTransport::new()
                .reply(Endpoint::Login, r#"{"data":""}"#)
                .reply(Endpoint::Courses, r#"{"data":[]}"#),
        );
        client.authenticate("a", "b").unwrap();
        assert_eq!(client.session().token(), Some(""));

        client.courses().unwrap();
        let calls = client.transport().calls_to(Endpoint::Courses);
        assert_eq!(calls[0].token, None);
    }

    #[test]
    fn courses_reject_non_array_data() {
        let client =
            logged_in(ScriptedTransport::new().reply(Endpoint::Courses, r#"{"data":"nope"}"#));
        assert!(matches!(
            client.courses().unwrap_err(),
            ApiError::Shape { expected: "an array", .. }
        ));
    }

    #[test]
    fn coursework_sends_course_id_field() {
        let client = logged_in(ScriptedTransport::new().coursework_for(
            5,
            r#"{"data":[{"workId":11,"workName":"HW1"},{"workName":"no id"}]}"#,
        ));
        let works = client.coursework(5).unwrap();
        assert_eq!(works, vec![Coursework { id: 11, name: "HW1".into() }]);
        let calls = client.transport().calls_to(Endpoint::Coursework);
        assert_eq!(calls[0].form, Some(vec![("courseId", "5".to_string())]));
    }

    #[test]
    fn submit_posts_work_id_and_full_grade_once() {
        let client = logged_in(ScriptedTransport::new().reply(Endpoint::Submit, "ignored"));
        client.submit(42, MAX_GRADE).unwrap();
        let calls = client.transport().calls_to(Endpoint::Submit);
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].form,
            Some(vec![("workId", "42".to_string()), ("grade", "100".to_string())])
        );
        assert_eq!(calls[0].token.as_deref(), Some("tok123"));
    }

    #[test]
    fn submit_outcome_depends_only_on_status() {
        let client = logged_in(ScriptedTransport::new().fail(Endpoint::Submit, 500));
        assert_eq!(client.submit(1, MAX_GRADE).unwrap_err().status(), Some(500));
    }

    #[test]
    fn logout_clears_token() {
        let mut client = logged_in(ScriptedTransport::new());
        client.logout();
        assert!(client.session().token().is_none());
    }
}
