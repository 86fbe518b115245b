use crate::models::*;
use crate::serde_helper::de_list;
use crate::{Role, Session, User};
use serde::{Deserialize, Serialize, de::DeserializeOwned, de::IgnoredAny};

/// HTTP Methods for API Requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// GET / DELETE 不携带请求体
    pub fn has_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put)
    }
}

/// A trait that defines the request-response relationship and metadata for an API endpoint.
///
/// 路径相对于 `<base>/api`，路径参数由 `path()` 拼接，不进入请求体。
pub trait ApiRequest: Serialize {
    /// The response type returned by this request.
    type Response: DeserializeOwned;
    /// The HTTP method.
    const METHOD: HttpMethod;
    /// 是否附带 `Authorization: Bearer <token>`（存在令牌时）
    const ATTACH_TOKEN: bool = true;

    fn path(&self) -> String;
}

/// 后端只返回确认信息时使用，响应体内容被忽略
pub type Ack = IgnoredAny;

// =========================================================
// 认证 (Auth)
// =========================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl ApiRequest for LoginRequest {
    type Response = Session;
    const METHOD: HttpMethod = HttpMethod::Post;
    const ATTACH_TOKEN: bool = false;

    fn path(&self) -> String {
        "/auth/login".into()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl ApiRequest for SignupRequest {
    type Response = Session;
    const METHOD: HttpMethod = HttpMethod::Post;
    const ATTACH_TOKEN: bool = false;

    fn path(&self) -> String {
        "/auth/signup".into()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileRequest;

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileResponse {
    pub user: User,
}

impl ApiRequest for ProfileRequest {
    type Response = ProfileResponse;
    const METHOD: HttpMethod = HttpMethod::Get;

    fn path(&self) -> String {
        "/auth/profile".into()
    }
}

// =========================================================
// 课程 (Courses)
// =========================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CourseEnvelope {
    pub course: Course,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CourseList {
    #[serde(default, deserialize_with = "de_list")]
    pub courses: Vec<Course>,
}

/// 创建接口可能返回 `{ course }` 也可能直接返回课程本身
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CreatedCourse {
    Wrapped { course: Course },
    Bare(Course),
}

impl CreatedCourse {
    pub fn into_course(self) -> Course {
        match self {
            CreatedCourse::Wrapped { course } => course,
            CreatedCourse::Bare(course) => course,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListCoursesRequest;

impl ApiRequest for ListCoursesRequest {
    type Response = CourseList;
    const METHOD: HttpMethod = HttpMethod::Get;

    fn path(&self) -> String {
        "/courses".into()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GetCourseRequest {
    #[serde(skip)]
    pub id: String,
}

impl ApiRequest for GetCourseRequest {
    type Response = CourseEnvelope;
    const METHOD: HttpMethod = HttpMethod::Get;

    fn path(&self) -> String {
        format!("/courses/{}", self.id)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InstructorCoursesRequest {
    #[serde(skip)]
    pub instructor_id: String,
}

impl ApiRequest for InstructorCoursesRequest {
    type Response = CourseList;
    const METHOD: HttpMethod = HttpMethod::Get;

    fn path(&self) -> String {
        format!("/courses/instructor/{}", self.instructor_id)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct CreateCourseRequest(pub CourseDraft);

impl ApiRequest for CreateCourseRequest {
    type Response = CreatedCourse;
    const METHOD: HttpMethod = HttpMethod::Post;

    fn path(&self) -> String {
        "/courses".into()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateCourseRequest {
    #[serde(skip)]
    pub id: String,
    #[serde(flatten)]
    pub patch: CoursePatch,
}

impl ApiRequest for UpdateCourseRequest {
    type Response = Ack;
    const METHOD: HttpMethod = HttpMethod::Put;

    fn path(&self) -> String {
        format!("/courses/{}", self.id)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteCourseRequest {
    #[serde(skip)]
    pub id: String,
}

impl ApiRequest for DeleteCourseRequest {
    type Response = Ack;
    const METHOD: HttpMethod = HttpMethod::Delete;

    fn path(&self) -> String {
        format!("/courses/{}", self.id)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompletedStudents {
    #[serde(default, deserialize_with = "de_list")]
    pub students: Vec<CompletedStudent>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletedStudentsRequest {
    #[serde(skip)]
    pub course_id: String,
}

impl ApiRequest for CompletedStudentsRequest {
    type Response = CompletedStudents;
    const METHOD: HttpMethod = HttpMethod::Get;

    fn path(&self) -> String {
        format!("/courses/{}/completed-students", self.course_id)
    }
}

// =========================================================
// 课时 (Lessons)
// =========================================================

#[derive(Debug, Clone, Deserialize)]
pub struct LessonList {
    #[serde(default, deserialize_with = "de_list")]
    pub lessons: Vec<Lesson>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LessonEnvelope {
    pub lesson: Lesson,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseLessonsRequest {
    #[serde(skip)]
    pub course_id: String,
}

impl ApiRequest for CourseLessonsRequest {
    type Response = LessonList;
    const METHOD: HttpMethod = HttpMethod::Get;

    fn path(&self) -> String {
        format!("/lessons/{}", self.course_id)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GetLessonRequest {
    #[serde(skip)]
    pub id: String,
}

impl ApiRequest for GetLessonRequest {
    type Response = LessonEnvelope;
    const METHOD: HttpMethod = HttpMethod::Get;

    fn path(&self) -> String {
        format!("/lessons/single/{}", self.id)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct CreateLessonRequest(pub LessonDraft);

impl ApiRequest for CreateLessonRequest {
    type Response = Ack;
    const METHOD: HttpMethod = HttpMethod::Post;

    fn path(&self) -> String {
        "/lessons".into()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateLessonRequest {
    #[serde(skip)]
    pub id: String,
    #[serde(flatten)]
    pub lesson: LessonDraft,
}

impl ApiRequest for UpdateLessonRequest {
    type Response = Ack;
    const METHOD: HttpMethod = HttpMethod::Put;

    fn path(&self) -> String {
        format!("/lessons/{}", self.id)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteLessonRequest {
    #[serde(skip)]
    pub id: String,
}

impl ApiRequest for DeleteLessonRequest {
    type Response = Ack;
    const METHOD: HttpMethod = HttpMethod::Delete;

    fn path(&self) -> String {
        format!("/lessons/{}", self.id)
    }
}

// =========================================================
// 进度 (Progress)
// =========================================================

#[derive(Debug, Clone, Serialize)]
pub struct CourseProgressRequest {
    #[serde(skip)]
    pub user_id: String,
    #[serde(skip)]
    pub course_id: String,
}

impl ApiRequest for CourseProgressRequest {
    type Response = CourseProgress;
    const METHOD: HttpMethod = HttpMethod::Get;

    fn path(&self) -> String {
        format!("/progress/{}/{}", self.user_id, self.course_id)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct UpdateProgressRequest(pub ProgressUpdate);

impl ApiRequest for UpdateProgressRequest {
    type Response = Ack;
    const METHOD: HttpMethod = HttpMethod::Post;

    fn path(&self) -> String {
        "/progress/update".into()
    }
}

/// `user_id` 为 None 时查询当前用户（`stats/me`）
#[derive(Debug, Clone, Serialize)]
pub struct ProgressStatsRequest {
    #[serde(skip)]
    pub user_id: Option<String>,
}

impl ApiRequest for ProgressStatsRequest {
    type Response = ProgressStats;
    const METHOD: HttpMethod = HttpMethod::Get;

    fn path(&self) -> String {
        format!("/progress/stats/{}", self.user_id.as_deref().unwrap_or("me"))
    }
}

// =========================================================
// 选课 (Enrollment)
// =========================================================

#[derive(Debug, Clone, Serialize)]
pub struct EnrollRequest {
    pub course_id: String,
}

impl ApiRequest for EnrollRequest {
    type Response = Ack;
    const METHOD: HttpMethod = HttpMethod::Post;

    fn path(&self) -> String {
        "/enrollment".into()
    }
}

/// `my-courses` 同时返回课程视图与原始选课记录
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MyCourses {
    #[serde(default, deserialize_with = "de_list")]
    pub courses: Vec<EnrolledCourse>,
    #[serde(default, deserialize_with = "de_list")]
    pub enrollments: Vec<Enrollment>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MyCoursesRequest;

impl ApiRequest for MyCoursesRequest {
    type Response = MyCourses;
    const METHOD: HttpMethod = HttpMethod::Get;

    fn path(&self) -> String {
        "/enrollment/my-courses".into()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnrollmentCheck {
    #[serde(default)]
    pub enrolled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckEnrollmentRequest {
    #[serde(skip)]
    pub course_id: String,
}

impl ApiRequest for CheckEnrollmentRequest {
    type Response = EnrollmentCheck;
    const METHOD: HttpMethod = HttpMethod::Get;

    fn path(&self) -> String {
        format!("/enrollment/check/{}", self.course_id)
    }
}

// =========================================================
// 测验 (Quiz)
// =========================================================

#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct CreateQuizRequest(pub QuizDraft);

impl ApiRequest for CreateQuizRequest {
    type Response = Ack;
    const METHOD: HttpMethod = HttpMethod::Post;

    fn path(&self) -> String {
        "/quiz/create".into()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuizEnvelope {
    #[serde(default)]
    pub quiz: Option<Quiz>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetQuizRequest {
    #[serde(skip)]
    pub course_id: String,
}

impl ApiRequest for GetQuizRequest {
    type Response = QuizEnvelope;
    const METHOD: HttpMethod = HttpMethod::Get;

    fn path(&self) -> String {
        format!("/quiz/{}", self.course_id)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct SubmitQuizRequest(pub QuizSubmission);

impl ApiRequest for SubmitQuizRequest {
    type Response = QuizResult;
    const METHOD: HttpMethod = HttpMethod::Post;

    fn path(&self) -> String {
        "/quiz/submit".into()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuizAttempts {
    #[serde(default, deserialize_with = "de_list")]
    pub attempts: Vec<QuizAttempt>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MyQuizAttemptsRequest;

impl ApiRequest for MyQuizAttemptsRequest {
    type Response = QuizAttempts;
    const METHOD: HttpMethod = HttpMethod::Get;

    fn path(&self) -> String {
        "/quiz/my-attempts".into()
    }
}

// =========================================================
// 支付 (Payment)
// =========================================================

#[derive(Debug, Clone, Serialize)]
pub struct CreateCheckoutRequest {
    pub course_id: String,
}

impl ApiRequest for CreateCheckoutRequest {
    type Response = CheckoutSession;
    const METHOD: HttpMethod = HttpMethod::Post;

    fn path(&self) -> String {
        "/payment/create-checkout-session".into()
    }
}

// =========================================================
// 通知 (Notifications)
// =========================================================

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationList {
    #[serde(default, deserialize_with = "de_list")]
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListNotificationsRequest;

impl ApiRequest for ListNotificationsRequest {
    type Response = NotificationList;
    const METHOD: HttpMethod = HttpMethod::Get;

    fn path(&self) -> String {
        "/notifications".into()
    }
}

/// 请求体为空对象 `{}`
#[derive(Debug, Clone, Serialize)]
pub struct MarkNotificationReadRequest {
    #[serde(skip)]
    pub id: String,
}

impl ApiRequest for MarkNotificationReadRequest {
    type Response = Ack;
    const METHOD: HttpMethod = HttpMethod::Put;

    fn path(&self) -> String {
        format!("/notifications/{}/read", self.id)
    }
}

// =========================================================
// 管理 (Admin)
// =========================================================

#[derive(Debug, Clone, Deserialize)]
pub struct AdminStatsEnvelope {
    #[serde(default)]
    pub stats: AdminStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminDashboardRequest;

impl ApiRequest for AdminDashboardRequest {
    type Response = AdminStatsEnvelope;
    const METHOD: HttpMethod = HttpMethod::Get;

    fn path(&self) -> String {
        "/admin/dashboard".into()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminUserList {
    #[serde(default, deserialize_with = "de_list")]
    pub users: Vec<AdminUser>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminUsersRequest;

impl ApiRequest for AdminUsersRequest {
    type Response = AdminUserList;
    const METHOD: HttpMethod = HttpMethod::Get;

    fn path(&self) -> String {
        "/admin/users".into()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminCoursesRequest;

impl ApiRequest for AdminCoursesRequest {
    type Response = CourseList;
    const METHOD: HttpMethod = HttpMethod::Get;

    fn path(&self) -> String {
        "/admin/courses".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_parameters_stay_out_of_body() {
        let req = UpdateCourseRequest {
            id: "c9".into(),
            patch: CoursePatch::publish(),
        };
        assert_eq!(req.path(), "/courses/c9");
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            serde_json::json!({ "status": "published" })
        );

        let read = MarkNotificationReadRequest { id: "n1".into() };
        assert_eq!(serde_json::to_value(&read).unwrap(), serde_json::json!({}));
    }

    #[test]
    fn test_stats_path_defaults_to_me() {
        assert_eq!(ProgressStatsRequest { user_id: None }.path(), "/progress/stats/me");
        assert_eq!(
            ProgressStatsRequest { user_id: Some("u1".into()) }.path(),
            "/progress/stats/u1"
        );
    }

    #[test]
    fn test_created_course_accepts_both_shapes() {
        let wrapped: CreatedCourse =
            serde_json::from_str(r#"{"course":{"id":1,"title":"A"}}"#).unwrap();
        assert_eq!(wrapped.into_course().id, "1");
        let bare: CreatedCourse = serde_json::from_str(r#"{"id":"2","title":"B"}"#).unwrap();
        assert_eq!(bare.into_course().id, "2");
    }

    #[test]
    fn test_auth_requests_do_not_attach_token() {
        assert!(!LoginRequest::ATTACH_TOKEN);
        assert!(!SignupRequest::ATTACH_TOKEN);
        assert!(ProfileRequest::ATTACH_TOKEN);
    }

    #[test]
    fn test_missing_quiz_is_none() {
        let env: QuizEnvelope = serde_json::from_str(r#"{"quiz":null}"#).unwrap();
        assert!(env.quiz.is_none());
    }
}
