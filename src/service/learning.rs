//! 观看进度、测验解锁与测验提交

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::require_fields;
use crate::cache::keys;
use crate::context::AppContext;
use crate::error::{ApiError, ApiResult};
use crate::request::HttpClient;
use crate::storage::StorageAdapter;
use coursehub_shared::protocol::{
    CourseLessonsRequest, CourseProgressRequest, CreateQuizRequest, GetQuizRequest,
    MyQuizAttemptsRequest, ProgressStatsRequest, SubmitQuizRequest, UpdateProgressRequest,
};
use coursehub_shared::{
    CourseProgress, Lesson, ProgressStats, ProgressUpdate, Quiz, QuizAttempt, QuizDraft,
    QuizResult, QuizSubmission,
};

/// 观看比例超过该值视为完成
pub const COMPLETION_THRESHOLD: f64 = 0.9;

/// 会话存储中的完成标记，每个用户每个课时只提交一次
pub const LESSON_COMPLETED_PREFIX: &str = "lesson_completed_";

fn completion_flag(user_id: &str, lesson_id: &str) -> String {
    format!("{}{}_{}", LESSON_COMPLETED_PREFIX, user_id, lesson_id)
}

/// 已选课，或课时标记为免费试看
pub fn lesson_playable(lesson: &Lesson, enrolled: bool) -> bool {
    enrolled || lesson.is_free
}

/// 时长未知（0、NaN）时按 0 处理
pub fn watched_fraction(current_time: f64, duration: f64) -> f64 {
    if !duration.is_finite() || duration <= 0.0 || !current_time.is_finite() {
        return 0.0;
    }
    (current_time / duration).clamp(0.0, 1.0)
}

// =========================================================
// 测验解锁
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizGate {
    pub completed: u32,
    pub total: u32,
}

impl QuizGate {
    /// 完成数等于课时总数；没有课时的课程直接解锁
    pub fn is_unlocked(&self) -> bool {
        self.total == 0 || self.completed == self.total
    }

    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        f64::from(self.completed) / f64::from(self.total) * 100.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchOutcome {
    /// 未超过完成阈值，不提交
    NotReached,
    /// 本次会话已提交过或正在提交
    AlreadyRecorded,
    /// 已提交完成，相关缓存已失效；延迟后重新拉取进度
    Completed { refetch_after: Duration },
}

impl<C: HttpClient + 'static> AppContext<C> {
    /// 解锁状态每次都重新计算，仅做短 TTL 缓存
    pub async fn quiz_gate(&self, course_id: &str) -> ApiResult<QuizGate> {
        let user = self.session.require_user()?;
        let api = self.api.clone();
        let course = course_id.to_string();
        let user_id = user.id.clone();

        let gate = self
            .cache
            .get_as_with_ttl(
                &keys::quiz_gate(course_id, &user.id),
                self.config.quiz_gate_ttl,
                move || async move {
                    let lessons = api
                        .send(&CourseLessonsRequest {
                            course_id: course.clone(),
                        })
                        .await?
                        .lessons;
                    if lessons.is_empty() {
                        return Ok(QuizGate {
                            completed: 0,
                            total: 0,
                        });
                    }
                    let progress = api
                        .send(&CourseProgressRequest {
                            user_id,
                            course_id: course,
                        })
                        .await?;
                    Ok(QuizGate {
                        completed: progress.lessons_completed,
                        total: lessons.len() as u32,
                    })
                },
            )
            .await
            .map_err(|e| e.in_op_with("learning.quiz_gate", course_id.to_string()))?;

        info!(
            "quiz gate for course {}: {}/{} lessons",
            course_id, gate.completed, gate.total
        );
        Ok(gate)
    }

    /// 检查失败时保持锁定
    pub async fn can_take_quiz(&self, course_id: &str) -> bool {
        match self.quiz_gate(course_id).await {
            Ok(gate) => gate.is_unlocked(),
            Err(e) => {
                warn!("quiz gate check failed: {}", e);
                false
            }
        }
    }

    pub async fn course_progress(&self, course_id: &str) -> ApiResult<CourseProgress> {
        let user = self.session.require_user()?;
        let api = self.api.clone();
        let req = CourseProgressRequest {
            user_id: user.id.clone(),
            course_id: course_id.to_string(),
        };
        self.cache
            .get_as(&keys::lesson_progress(course_id, &user.id), move || async move {
                api.send(&req).await
            })
            .await
            .map_err(|e| e.in_op_with("learning.course_progress", course_id.to_string()))
    }

    pub async fn progress_stats(&self) -> ApiResult<ProgressStats> {
        let user = self.session.require_user()?;
        let api = self.api.clone();
        let req = ProgressStatsRequest {
            user_id: Some(user.id.clone()),
        };
        self.cache
            .get_as(&keys::progress_stats(&user.id), move || async move {
                api.send(&req).await
            })
            .await
            .map_err(|e| e.in_op("learning.progress_stats"))
    }

    /// 播放进度回调
    ///
    /// 超过阈值时提交一次 `completed = true`。提交成功后写入会话标记，
    /// 同一会话内同一课时不会再次提交；提交失败不写标记，之后可以重试。
    pub async fn record_watch(
        &self,
        course_id: &str,
        lesson_id: &str,
        current_time: f64,
        duration: f64,
    ) -> ApiResult<WatchOutcome> {
        if watched_fraction(current_time, duration) <= COMPLETION_THRESHOLD {
            return Ok(WatchOutcome::NotReached);
        }

        let user = self.session.require_user()?;
        let flag = completion_flag(&user.id, lesson_id);
        if self.scratch.get(&flag).is_some() || !self.completing.borrow_mut().insert(flag.clone()) {
            return Ok(WatchOutcome::AlreadyRecorded);
        }

        let update = ProgressUpdate {
            lesson_id: lesson_id.to_string(),
            course_id: course_id.to_string(),
            watched_duration: current_time.max(0.0).floor() as u64,
            completed: true,
        };
        let result = self.api.send(&UpdateProgressRequest(update)).await;
        self.completing.borrow_mut().remove(&flag);
        result.map_err(|e| e.in_op_with("learning.record_watch", lesson_id.to_string()))?;

        self.scratch.set(&flag, "true");
        self.invalidate_course_progress(course_id, &user.id);
        info!("lesson {} completed by {}", lesson_id, user.id);

        Ok(WatchOutcome::Completed {
            refetch_after: self.config.refetch_delay,
        })
    }

    /// 完成后延迟重新拉取：进度与测验解锁状态
    pub async fn refresh_course_progress(&self, course_id: &str) -> ApiResult<(CourseProgress, QuizGate)> {
        let (progress, gate) =
            futures::join!(self.course_progress(course_id), self.quiz_gate(course_id));
        Ok((progress?, gate?))
    }

    fn invalidate_course_progress(&self, course_id: &str, user_id: &str) {
        self.cache.clear(&keys::course(course_id));
        self.cache.clear(&keys::lesson_progress(course_id, user_id));
        self.cache.clear(&keys::enrollment(course_id, user_id));
        self.cache.clear(&keys::quiz_gate(course_id, user_id));
        self.cache.clear(&keys::my_courses(user_id));
        self.cache.clear(&keys::progress_stats(user_id));
    }

    // =========================================================
    // 测验
    // =========================================================

    /// 课程没有测验时返回 None
    pub async fn quiz(&self, course_id: &str) -> ApiResult<Option<Quiz>> {
        let api = self.api.clone();
        let req = GetQuizRequest {
            course_id: course_id.to_string(),
        };
        let result = self
            .cache
            .get_as(&keys::quiz(course_id), move || async move {
                api.send(&req).await.map(|r| r.quiz)
            })
            .await;
        match result {
            Err(e) if e.is_not_found() => Ok(None),
            other => other.map_err(|e| e.in_op_with("learning.quiz", course_id.to_string())),
        }
    }

    /// `answers[i]` 为第 i 题所选选项的下标，必须全部作答
    pub async fn submit_quiz(&self, quiz: &Quiz, answers: &[Option<usize>]) -> ApiResult<QuizResult> {
        let user = self.session.require_user()?;
        if answers.len() != quiz.questions.len() || answers.iter().any(Option::is_none) {
            return Err(ApiError::invalid_input("Please answer all questions"));
        }

        let submission = QuizSubmission {
            quiz_id: quiz.id.clone(),
            answers: answers.iter().flatten().map(|i| i.to_string()).collect(),
        };
        let result = self
            .api
            .send(&SubmitQuizRequest(submission))
            .await
            .map_err(|e| e.in_op_with("learning.submit_quiz", quiz.id.clone()))?;

        self.cache.clear(&keys::progress_stats(&user.id));
        info!(
            "quiz {} submitted: score {} passed {}",
            quiz.id, result.score, result.passed
        );
        Ok(result)
    }

    pub async fn my_quiz_attempts(&self) -> ApiResult<Vec<QuizAttempt>> {
        self.session.require_user()?;
        self.api
            .send(&MyQuizAttemptsRequest)
            .await
            .map(|r| r.attempts)
            .map_err(|e| e.in_op("learning.my_quiz_attempts"))
    }

    pub async fn create_quiz(&self, draft: QuizDraft) -> ApiResult<()> {
        validate_quiz(&draft)?;
        self.api
            .send(&CreateQuizRequest(draft.clone()))
            .await
            .map_err(|e| e.in_op_with("learning.create_quiz", draft.course_id.clone()))?;
        self.cache.clear(&keys::quiz(&draft.course_id));
        Ok(())
    }
}

/// 至少一道题；每题题干非空、至少两个非空选项、正确选项下标有效
pub fn validate_quiz(draft: &QuizDraft) -> ApiResult<()> {
    require_fields(&[("Course", draft.course_id.as_str()), ("Quiz title", draft.title.as_str())])?;
    if draft.questions.is_empty() {
        return Err(ApiError::invalid_input("Add at least one question"));
    }
    if !(0.0..=100.0).contains(&draft.passing_score) {
        return Err(ApiError::invalid_input("Passing score must be between 0 and 100"));
    }

    for (index, question) in draft.questions.iter().enumerate() {
        let number = index + 1;
        if question.question.trim().is_empty() {
            return Err(ApiError::invalid_input(format!("Question {} is required", number)));
        }
        if question.options.len() < 2 || question.options.iter().any(|o| o.trim().is_empty()) {
            return Err(ApiError::invalid_input(format!(
                "Question {} needs at least two non-empty options",
                number
            )));
        }
        match question.correct_answer {
            Some(answer) if answer < question.options.len() => {}
            _ => {
                return Err(ApiError::invalid_input(format!(
                    "Question {} has no valid correct answer",
                    number
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiErrorStatus;
    use crate::service::testing::Harness;
    use coursehub_shared::{HttpMethod, QuizQuestion, Role};
    use serde_json::json;

    fn lessons_json(n: usize) -> serde_json::Value {
        let lessons: Vec<_> = (0..n)
            .map(|i| json!({"id": format!("l{}", i), "title": format!("Lesson {}", i)}))
            .collect();
        json!({ "lessons": lessons })
    }

    fn question(options: &[&str], correct: Option<usize>) -> QuizQuestion {
        QuizQuestion {
            question: "What is ownership?".into(),
            options: options.iter().map(|o| o.to_string()).collect(),
            correct_answer: correct,
        }
    }

    fn quiz_with(n: usize) -> Quiz {
        Quiz {
            id: "q1".into(),
            course_id: Some("c1".into()),
            title: Some("Final".into()),
            questions: (0..n).map(|_| question(&["a", "b"], None)).collect(),
            passing_score: 70.0,
        }
    }

    #[test]
    fn test_watched_fraction_and_playability() {
        assert_eq!(watched_fraction(95.0, 100.0), 0.95);
        assert_eq!(watched_fraction(10.0, 0.0), 0.0);
        assert_eq!(watched_fraction(10.0, f64::NAN), 0.0);
        assert_eq!(watched_fraction(120.0, 100.0), 1.0);

        let lesson: Lesson = serde_json::from_value(json!({"id": "l1", "is_free": true})).unwrap();
        assert!(lesson_playable(&lesson, false));
        let lesson: Lesson = serde_json::from_value(json!({"id": "l2"})).unwrap();
        assert!(!lesson_playable(&lesson, false));
        assert!(lesson_playable(&lesson, true));
    }

    #[test]
    fn test_gate_unlock_rule() {
        assert!(QuizGate { completed: 0, total: 0 }.is_unlocked());
        assert!(QuizGate { completed: 3, total: 3 }.is_unlocked());
        assert!(!QuizGate { completed: 2, total: 3 }.is_unlocked());
        assert_eq!(QuizGate { completed: 1, total: 4 }.percent(), 25.0);
    }

    #[tokio::test]
    async fn test_quiz_gate_counts_completed_lessons() {
        let h = Harness::new();
        h.sign_in(Role::Student);
        h.mock_ok(HttpMethod::Get, "/lessons/c1", lessons_json(3));
        h.mock_ok(HttpMethod::Get, "/progress/u1/c1", json!({"lessons_completed": 2, "total_lessons": 3}));

        let gate = h.ctx.quiz_gate("c1").await.unwrap();
        assert_eq!(gate, QuizGate { completed: 2, total: 3 });
        assert!(!h.ctx.can_take_quiz("c1").await);
    }

    #[tokio::test]
    async fn test_quiz_gate_without_lessons_skips_progress() {
        let h = Harness::new();
        h.sign_in(Role::Student);
        h.mock_ok(HttpMethod::Get, "/lessons/c1", json!({"lessons": []}));

        assert!(h.ctx.can_take_quiz("c1").await);
        assert_eq!(h.count(HttpMethod::Get, "/progress/u1/c1"), 0);
    }

    #[tokio::test]
    async fn test_quiz_gate_expires_quickly() {
        let h = Harness::new();
        h.sign_in(Role::Student);
        h.mock_ok(HttpMethod::Get, "/lessons/c1", lessons_json(2));
        h.mock_ok(HttpMethod::Get, "/progress/u1/c1", json!({"lessons_completed": 1}));

        h.ctx.quiz_gate("c1").await.unwrap();
        h.clock.advance(Duration::from_secs(5));
        h.ctx.quiz_gate("c1").await.unwrap();
        assert_eq!(h.count(HttpMethod::Get, "/progress/u1/c1"), 1);

        h.mock_ok(HttpMethod::Get, "/progress/u1/c1", json!({"lessons_completed": 2}));
        h.clock.advance(Duration::from_secs(6));
        assert!(h.ctx.can_take_quiz("c1").await);
        assert_eq!(h.count(HttpMethod::Get, "/progress/u1/c1"), 2);
    }

    #[tokio::test]
    async fn test_gate_failure_keeps_quiz_locked() {
        let h = Harness::new();
        h.sign_in(Role::Student);
        h.mock(HttpMethod::Get, "/lessons/c1", 500, json!({"error": "boom"}));
        assert!(!h.ctx.can_take_quiz("c1").await);

        // 未登录同样锁定
        h.ctx.logout();
        assert!(!h.ctx.can_take_quiz("c1").await);
    }

    #[tokio::test]
    async fn test_completion_sent_once_per_lesson() {
        let h = Harness::new();
        h.sign_in(Role::Student);
        h.mock_ok(HttpMethod::Post, "/progress/update", json!({"success": true}));

        let outcome = h.ctx.record_watch("c1", "l1", 50.0, 100.0).await.unwrap();
        assert_eq!(outcome, WatchOutcome::NotReached);
        assert_eq!(h.count(HttpMethod::Post, "/progress/update"), 0);

        let outcome = h.ctx.record_watch("c1", "l1", 95.4, 100.0).await.unwrap();
        assert_eq!(
            outcome,
            WatchOutcome::Completed {
                refetch_after: Duration::from_secs(3)
            }
        );
        let body = h.http.last().unwrap().json_body().unwrap();
        assert_eq!(
            body,
            json!({"lesson_id": "l1", "course_id": "c1", "watched_duration": 95, "completed": true})
        );

        let outcome = h.ctx.record_watch("c1", "l1", 99.0, 100.0).await.unwrap();
        assert_eq!(outcome, WatchOutcome::AlreadyRecorded);
        assert_eq!(h.count(HttpMethod::Post, "/progress/update"), 1);
        assert!(h.scratch.get("lesson_completed_u1_l1").is_some());

        // 其他课时不受影响
        h.ctx.record_watch("c1", "l2", 99.0, 100.0).await.unwrap();
        assert_eq!(h.count(HttpMethod::Post, "/progress/update"), 2);
    }

    #[tokio::test]
    async fn test_exactly_ninety_percent_is_not_complete() {
        let h = Harness::new();
        h.sign_in(Role::Student);
        let outcome = h.ctx.record_watch("c1", "l1", 90.0, 100.0).await.unwrap();
        assert_eq!(outcome, WatchOutcome::NotReached);
    }

    #[tokio::test]
    async fn test_failed_completion_can_be_retried() {
        let h = Harness::new();
        h.sign_in(Role::Student);
        h.mock(HttpMethod::Post, "/progress/update", 500, json!({"error": "db down"}));

        let err = h.ctx.record_watch("c1", "l1", 95.0, 100.0).await.unwrap_err();
        assert_eq!(err.message(), "db down");
        assert!(h.scratch.get("lesson_completed_u1_l1").is_none());

        h.mock_ok(HttpMethod::Post, "/progress/update", json!({}));
        let outcome = h.ctx.record_watch("c1", "l1", 95.0, 100.0).await.unwrap();
        assert!(matches!(outcome, WatchOutcome::Completed { .. }));
    }

    #[tokio::test]
    async fn test_completion_invalidates_progress_views() {
        let h = Harness::new();
        h.sign_in(Role::Student);
        h.mock_ok(HttpMethod::Get, "/progress/u1/c1", json!({"lessons_completed": 0, "total_lessons": 1}));
        h.mock_ok(HttpMethod::Get, "/lessons/c1", lessons_json(1));
        h.mock_ok(HttpMethod::Post, "/progress/update", json!({}));

        h.ctx.course_progress("c1").await.unwrap();
        assert!(!h.ctx.can_take_quiz("c1").await);
        assert!(h.scratch.get("cache:lesson_progress_c1_u1").is_some());

        h.ctx.record_watch("c1", "l0", 100.0, 100.0).await.unwrap();
        assert!(h.scratch.get("cache:lesson_progress_c1_u1").is_none());

        h.mock_ok(HttpMethod::Get, "/progress/u1/c1", json!({"lessons_completed": 1, "total_lessons": 1}));
        let (progress, gate) = h.ctx.refresh_course_progress("c1").await.unwrap();
        assert_eq!(progress.lessons_completed, 1);
        assert!(gate.is_unlocked());
    }

    #[tokio::test]
    async fn test_missing_quiz_is_none() {
        let h = Harness::new();
        h.sign_in(Role::Student);
        h.mock(HttpMethod::Get, "/quiz/c1", 404, json!({"error": "Quiz not found"}));
        assert_eq!(h.ctx.quiz("c1").await.unwrap(), None);

        h.mock_ok(HttpMethod::Get, "/quiz/c2", json!({"quiz": null}));
        assert_eq!(h.ctx.quiz("c2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_submit_requires_every_answer() {
        let h = Harness::new();
        h.sign_in(Role::Student);
        let quiz = quiz_with(2);

        let err = h.ctx.submit_quiz(&quiz, &[Some(0), None]).await.unwrap_err();
        assert_eq!(err.status, ApiErrorStatus::InvalidInput);
        let err = h.ctx.submit_quiz(&quiz, &[Some(0)]).await.unwrap_err();
        assert_eq!(err.message(), "Please answer all questions");

        h.mock_ok(
            HttpMethod::Post,
            "/quiz/submit",
            json!({"score": 50, "passed": false, "correct_answers": 1, "total_questions": 2}),
        );
        let result = h.ctx.submit_quiz(&quiz, &[Some(1), Some(0)]).await.unwrap();
        assert!(!result.passed);
        assert_eq!(
            h.http.last().unwrap().json_body().unwrap(),
            json!({"quiz_id": "q1", "answers": ["1", "0"]})
        );
    }

    #[test]
    fn test_quiz_validation() {
        let mut draft = QuizDraft {
            course_id: "c1".into(),
            title: "Final".into(),
            questions: vec![question(&["a", "b"], Some(1))],
            passing_score: 70.0,
        };
        assert!(validate_quiz(&draft).is_ok());

        draft.questions.push(question(&["a", ""], Some(0)));
        assert_eq!(
            validate_quiz(&draft).unwrap_err().message(),
            "Question 2 needs at least two non-empty options"
        );

        draft.questions[1] = question(&["a", "b"], Some(2));
        assert_eq!(
            validate_quiz(&draft).unwrap_err().message(),
            "Question 2 has no valid correct answer"
        );

        draft.questions.truncate(1);
        draft.passing_score = 120.0;
        assert!(validate_quiz(&draft).is_err());
    }

    #[tokio::test]
    async fn test_create_quiz_posts_draft() {
        let h = Harness::new();
        h.sign_in(Role::Instructor);
        h.mock_ok(HttpMethod::Post, "/quiz/create", json!({"quiz": {"id": "q9"}}));

        let draft = QuizDraft {
            course_id: "c1".into(),
            title: "Final".into(),
            questions: vec![question(&["yes", "no"], Some(0))],
            passing_score: 70.0,
        };
        h.ctx.create_quiz(draft).await.unwrap();

        let body = h.http.last().unwrap().json_body().unwrap();
        assert_eq!(body["course_id"], "c1");
        assert_eq!(body["questions"][0]["correct_answer"], 0);
    }
}
