//! 讲师：课程与课时的编写
//!
//! 课程加课时的多步保存不是事务：课程写入后逐个提交课时，
//! 中途失败不会回滚已经成功的部分，报告中只保留最后一个错误。

use log::{info, warn};

use super::require_fields;
use crate::cache::keys;
use crate::context::AppContext;
use crate::error::{ApiError, ApiResult};
use crate::request::HttpClient;
use coursehub_shared::protocol::{
    CompletedStudentsRequest, CreateCourseRequest, CreateLessonRequest, DeleteCourseRequest,
    DeleteLessonRequest, InstructorCoursesRequest, UpdateCourseRequest, UpdateLessonRequest,
};
use coursehub_shared::{
    CompletedStudent, Course, CourseDraft, CoursePatch, CourseStatus, Lesson, LessonDraft,
};

// =========================================================
// 表单
// =========================================================

/// 编辑页中的一个课时；`id` 为空表示新建
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LessonForm {
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub duration: f64,
    pub is_free: bool,
    pub order_index: i64,
}

impl LessonForm {
    /// 标题和视频地址都填写了才会提交
    pub fn is_complete(&self) -> bool {
        !self.title.trim().is_empty() && !self.video_url.trim().is_empty()
    }

    pub fn to_draft(&self, course_id: &str) -> LessonDraft {
        let description = self.description.trim();
        LessonDraft {
            course_id: course_id.to_string(),
            title: self.title.trim().to_string(),
            description: (!description.is_empty()).then(|| description.to_string()),
            video_url: Some(self.video_url.trim().to_string()),
            duration: self.duration,
            is_free: self.is_free,
            order_index: Some(self.order_index),
        }
    }
}

impl From<&Lesson> for LessonForm {
    fn from(lesson: &Lesson) -> Self {
        Self {
            id: Some(lesson.id.clone()),
            title: lesson.title.clone(),
            description: lesson.description.clone().unwrap_or_default(),
            video_url: lesson.video_url.clone().unwrap_or_default(),
            duration: lesson.duration,
            is_free: lesson.is_free,
            order_index: lesson.order_index.unwrap_or_default(),
        }
    }
}

/// 多步保存的结果
#[derive(Debug, Clone, PartialEq)]
pub struct SaveReport {
    pub course_id: String,
    pub saved: usize,
    /// 未填写完整、没有提交的课时
    pub skipped: usize,
    pub failed: usize,
    pub last_error: Option<ApiError>,
}

impl SaveReport {
    fn new(course_id: &str) -> Self {
        Self {
            course_id: course_id.to_string(),
            saved: 0,
            skipped: 0,
            failed: 0,
            last_error: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.last_error.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InstructorStats {
    pub total: usize,
    pub published: usize,
    pub drafts: usize,
    pub students: f64,
}

impl InstructorStats {
    pub fn from_courses(courses: &[Course]) -> Self {
        let count = |status: CourseStatus| courses.iter().filter(|c| c.status == Some(status)).count();
        Self {
            total: courses.len(),
            published: count(CourseStatus::Published),
            drafts: count(CourseStatus::Draft),
            students: courses.iter().map(|c| c.enrollment_count).sum(),
        }
    }
}

pub fn validate_course(draft: &CourseDraft) -> ApiResult<()> {
    require_fields(&[
        ("Title", draft.title.as_str()),
        ("Description", draft.description.as_str()),
        ("Category", draft.category.as_str()),
    ])?;
    if !draft.price.is_finite() || draft.price < 0.0 {
        return Err(ApiError::invalid_input("Price must be zero or a positive number"));
    }
    Ok(())
}

impl<C: HttpClient + 'static> AppContext<C> {
    pub async fn instructor_courses(&self) -> ApiResult<Vec<Course>> {
        let user = self.session.require_user()?;
        let api = self.api.clone();
        let req = InstructorCoursesRequest {
            instructor_id: user.id.clone(),
        };
        self.cache
            .get_as(&keys::instructor_courses(&user.id), move || async move {
                api.send(&req).await.map(|r| r.courses)
            })
            .await
            .map_err(|e| e.in_op("instructor.courses"))
    }

    pub async fn create_course(&self, draft: CourseDraft) -> ApiResult<Course> {
        self.session.require_user()?;
        validate_course(&draft)?;
        let course = self
            .api
            .send(&CreateCourseRequest(draft))
            .await
            .map_err(|e| e.in_op("instructor.create_course"))?
            .into_course();
        self.invalidate_catalog(None);
        info!("course {} created", course.id);
        Ok(course)
    }

    pub async fn update_course(&self, id: &str, patch: CoursePatch) -> ApiResult<()> {
        self.api
            .send(&UpdateCourseRequest {
                id: id.to_string(),
                patch,
            })
            .await
            .map_err(|e| e.in_op_with("instructor.update_course", id.to_string()))?;
        self.invalidate_catalog(Some(id));
        Ok(())
    }

    pub async fn publish_course(&self, id: &str) -> ApiResult<()> {
        self.update_course(id, CoursePatch::publish()).await
    }

    pub async fn delete_course(&self, id: &str) -> ApiResult<()> {
        self.api
            .send(&DeleteCourseRequest { id: id.to_string() })
            .await
            .map_err(|e| e.in_op_with("instructor.delete_course", id.to_string()))?;
        self.invalidate_catalog(Some(id));
        self.cache.clear(&keys::lessons(id));
        info!("course {} deleted", id);
        Ok(())
    }

    pub async fn create_lesson(&self, draft: LessonDraft) -> ApiResult<()> {
        require_fields(&[("Course", draft.course_id.as_str()), ("Lesson title", draft.title.as_str())])?;
        let course_id = draft.course_id.clone();
        self.api
            .send(&CreateLessonRequest(draft))
            .await
            .map_err(|e| e.in_op_with("instructor.create_lesson", course_id.clone()))?;
        self.invalidate_lessons(&course_id);
        Ok(())
    }

    pub async fn update_lesson(&self, id: &str, draft: LessonDraft) -> ApiResult<()> {
        let course_id = draft.course_id.clone();
        self.api
            .send(&UpdateLessonRequest {
                id: id.to_string(),
                lesson: draft,
            })
            .await
            .map_err(|e| e.in_op_with("instructor.update_lesson", id.to_string()))?;
        self.invalidate_lessons(&course_id);
        Ok(())
    }

    pub async fn delete_lesson(&self, id: &str, course_id: &str) -> ApiResult<()> {
        self.api
            .send(&DeleteLessonRequest { id: id.to_string() })
            .await
            .map_err(|e| e.in_op_with("instructor.delete_lesson", id.to_string()))?;
        self.invalidate_lessons(course_id);
        Ok(())
    }

    /// 编辑页的初始数据
    pub async fn course_for_edit(&self, id: &str) -> ApiResult<(Course, Vec<LessonForm>)> {
        let (course, lessons) = futures::join!(self.course(id), self.lessons(id));
        let forms = lessons?.iter().map(LessonForm::from).collect();
        Ok((course?, forms))
    }

    /// 先创建课程，再逐个创建填写完整的课时
    ///
    /// 课程创建失败直接返回错误；课时失败记录在报告中。
    pub async fn create_course_with_lessons(
        &self,
        draft: CourseDraft,
        lessons: &[LessonForm],
    ) -> ApiResult<SaveReport> {
        let course = self.create_course(draft).await?;
        let mut report = SaveReport::new(&course.id);
        for lesson in lessons {
            if !lesson.is_complete() {
                report.skipped += 1;
                continue;
            }
            let result = self.create_lesson(lesson.to_draft(&course.id)).await;
            record(&mut report, result);
        }
        Ok(report)
    }

    /// 更新课程，再逐个更新已有课时或创建新课时
    pub async fn save_course_with_lessons(
        &self,
        id: &str,
        patch: CoursePatch,
        lessons: &[LessonForm],
    ) -> ApiResult<SaveReport> {
        self.update_course(id, patch).await?;
        let mut report = SaveReport::new(id);
        for lesson in lessons {
            if !lesson.is_complete() {
                report.skipped += 1;
                continue;
            }
            let draft = lesson.to_draft(id);
            let result = match &lesson.id {
                Some(lesson_id) => self.update_lesson(lesson_id, draft).await,
                None => self.create_lesson(draft).await,
            };
            record(&mut report, result);
        }
        Ok(report)
    }

    pub async fn completed_students(&self, course_id: &str) -> ApiResult<Vec<CompletedStudent>> {
        self.api
            .send(&CompletedStudentsRequest {
                course_id: course_id.to_string(),
            })
            .await
            .map(|r| r.students)
            .map_err(|e| e.in_op_with("instructor.completed_students", course_id.to_string()))
    }

    /// 课程变更后失效目录相关的缓存
    pub(crate) fn invalidate_catalog(&self, course_id: Option<&str>) {
        self.cache.clear(keys::COURSES_ALL);
        self.cache.clear(keys::ADMIN_OVERVIEW);
        self.cache.clear_prefix("instructor_courses_");
        if let Some(id) = course_id {
            self.cache.clear(&keys::course(id));
        }
    }

    fn invalidate_lessons(&self, course_id: &str) {
        self.cache.clear(&keys::lessons(course_id));
        self.cache.clear(&keys::course(course_id));
    }
}

fn record(report: &mut SaveReport, result: ApiResult<()>) {
    match result {
        Ok(()) => report.saved += 1,
        Err(e) => {
            warn!("lesson save failed for course {}: {}", report.course_id, e);
            report.failed += 1;
            report.last_error = Some(e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiErrorStatus;
    use crate::service::testing::{Harness, course_json};
    use coursehub_shared::{HttpMethod, Role};
    use serde_json::json;

    fn draft() -> CourseDraft {
        CourseDraft {
            title: "Rust".into(),
            description: "Ownership and borrowing".into(),
            price: 0.0,
            category: "Programming".into(),
            thumbnail_url: None,
        }
    }

    fn lesson_form(title: &str, video: &str) -> LessonForm {
        LessonForm {
            title: title.into(),
            video_url: video.into(),
            order_index: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_course_validation() {
        assert!(validate_course(&draft()).is_ok());

        let mut bad = draft();
        bad.category = " ".into();
        assert_eq!(validate_course(&bad).unwrap_err().message(), "Category is required");

        let mut bad = draft();
        bad.price = -1.0;
        assert_eq!(validate_course(&bad).unwrap_err().status, ApiErrorStatus::InvalidInput);
    }

    #[test]
    fn test_instructor_stats() {
        let courses: Vec<Course> = serde_json::from_value(json!([
            {"id": "1", "status": "published", "enrollment_count": 3},
            {"id": "2", "status": "draft"},
            {"id": "3", "status": "published", "enrollment_count": "2"}
        ]))
        .unwrap();
        let stats = InstructorStats::from_courses(&courses);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.published, 2);
        assert_eq!(stats.drafts, 1);
        assert_eq!(stats.students, 5.0);
    }

    #[tokio::test]
    async fn test_instructor_courses_use_own_id() {
        let h = Harness::new();
        h.sign_in(Role::Instructor);
        h.mock_ok(
            HttpMethod::Get,
            "/courses/instructor/u1",
            json!({"courses": [course_json("c1", "Rust", json!(0))]}),
        );

        let courses = h.ctx.instructor_courses().await.unwrap();
        assert_eq!(courses.len(), 1);
    }

    #[tokio::test]
    async fn test_create_course_accepts_both_response_shapes() {
        let h = Harness::new();
        h.sign_in(Role::Instructor);

        h.mock_ok(HttpMethod::Post, "/courses", json!({"course": course_json("c1", "Rust", json!(0))}));
        assert_eq!(h.ctx.create_course(draft()).await.unwrap().id, "c1");

        h.mock_ok(HttpMethod::Post, "/courses", course_json("c2", "Rust", json!(0)));
        assert_eq!(h.ctx.create_course(draft()).await.unwrap().id, "c2");
    }

    #[tokio::test]
    async fn test_mutations_invalidate_catalog() {
        let h = Harness::new();
        h.sign_in(Role::Instructor);
        h.mock_ok(HttpMethod::Get, "/courses", json!({"courses": []}));
        h.mock_ok(HttpMethod::Put, "/courses/c1", json!({"message": "updated"}));

        h.ctx.all_courses().await.unwrap();
        h.ctx.publish_course("c1").await.unwrap();
        h.ctx.all_courses().await.unwrap();

        assert_eq!(h.count(HttpMethod::Get, "/courses"), 2);
        assert_eq!(
            h.sent_body(HttpMethod::Put, "/courses/c1"),
            Some(json!({"status": "published"}))
        );
    }

    #[tokio::test]
    async fn test_multi_step_creation_reports_last_error() {
        let h = Harness::new();
        h.sign_in(Role::Instructor);
        h.mock_ok(HttpMethod::Post, "/courses", json!({"course": course_json("c9", "Rust", json!(0))}));
        h.mock(HttpMethod::Post, "/lessons", 500, json!({"error": "Lesson insert failed"}));

        let lessons = vec![
            lesson_form("One", "https://cdn/1.mp4"),
            lesson_form("", "https://cdn/2.mp4"),
            lesson_form("Three", "https://cdn/3.mp4"),
        ];
        let report = h.ctx.create_course_with_lessons(draft(), &lessons).await.unwrap();

        assert_eq!(report.course_id, "c9");
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed, 2);
        assert!(!report.is_complete());
        assert_eq!(report.last_error.unwrap().message(), "Lesson insert failed");
        // 课程本身没有回滚
        assert_eq!(h.count(HttpMethod::Delete, "/courses/c9"), 0);
        assert_eq!(h.count(HttpMethod::Post, "/lessons"), 2);
    }

    #[tokio::test]
    async fn test_save_updates_existing_and_creates_new_lessons() {
        let h = Harness::new();
        h.sign_in(Role::Instructor);
        h.mock_ok(HttpMethod::Put, "/courses/c1", json!({}));
        h.mock_ok(HttpMethod::Put, "/lessons/l1", json!({}));
        h.mock_ok(HttpMethod::Post, "/lessons", json!({}));

        let mut existing = lesson_form("Intro", "https://cdn/1.mp4");
        existing.id = Some("l1".into());
        let lessons = vec![existing, lesson_form("New", "https://cdn/2.mp4")];

        let report = h
            .ctx
            .save_course_with_lessons("c1", CoursePatch::default(), &lessons)
            .await
            .unwrap();
        assert!(report.is_complete());
        assert_eq!(report.saved, 2);

        let created = h.http.last().unwrap().json_body().unwrap();
        assert_eq!(created["course_id"], "c1");
        assert_eq!(created["title"], "New");
    }

    #[tokio::test]
    async fn test_course_update_failure_stops_before_lessons() {
        let h = Harness::new();
        h.sign_in(Role::Instructor);
        h.mock(HttpMethod::Put, "/courses/c1", 403, json!({"error": "Not your course"}));

        let err = h
            .ctx
            .save_course_with_lessons("c1", CoursePatch::default(), &[lesson_form("A", "v")])
            .await
            .unwrap_err();
        assert_eq!(err.status, ApiErrorStatus::Forbidden);
        assert_eq!(h.count(HttpMethod::Post, "/lessons"), 0);
    }

    #[tokio::test]
    async fn test_course_for_edit_maps_lessons_to_forms() {
        let h = Harness::new();
        h.sign_in(Role::Instructor);
        h.mock_ok(HttpMethod::Get, "/courses/c1", json!({"course": course_json("c1", "Rust", json!(0))}));
        h.mock_ok(
            HttpMethod::Get,
            "/lessons/c1",
            json!({"lessons": [{"id": "l1", "title": "Intro", "video_url": "https://cdn/1.mp4", "order_index": 1}]}),
        );

        let (course, forms) = h.ctx.course_for_edit("c1").await.unwrap();
        assert_eq!(course.title, "Rust");
        assert_eq!(forms[0].id.as_deref(), Some("l1"));
        assert!(forms[0].is_complete());
    }

    #[tokio::test]
    async fn test_completed_students() {
        let h = Harness::new();
        h.sign_in(Role::Instructor);
        h.mock_ok(
            HttpMethod::Get,
            "/courses/c1/completed-students",
            json!({"students": [{"id": 4, "name": "Grace", "email": "g@x.io", "completed_at": "2024-06-01T00:00:00Z"}]}),
        );
        let students = h.ctx.completed_students("c1").await.unwrap();
        assert_eq!(students[0].name, "Grace");
        assert_eq!(students[0].id.as_deref(), Some("4"));
    }
}
