//! 后端聚合的只读投影
//!
//! 客户端不拥有这些记录的规范结构，只按需解析用到的字段，其余字段忽略。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Role;
use crate::serde_helper::{de_id, de_list, de_number, de_opt_datetime, de_opt_id, de_opt_number};

// =========================================================
// 课程 (Course)
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseStatus {
    Draft,
    Published,
    Archived,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstructorSummary {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// 后端可能返回数字或数字字符串；缺失或 `null` 时价格未知
    #[serde(default, deserialize_with = "de_opt_number")]
    pub price: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub status: Option<CourseStatus>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub instructor_id: Option<String>,
    #[serde(default)]
    pub instructor: Option<InstructorSummary>,
    #[serde(default, deserialize_with = "de_number")]
    pub enrollment_count: f64,
    #[serde(default, deserialize_with = "de_opt_datetime")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Course {
    /// 价格恰好为 0 才算免费课程，价格未知的按付费处理
    pub fn is_free(&self) -> bool {
        self.price == Some(0.0)
    }
}

/// 创建课程的表单内容
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CourseDraft {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

/// 课程局部更新，只序列化设置了的字段
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoursePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CourseStatus>,
}

impl CoursePatch {
    pub fn publish() -> Self {
        Self {
            status: Some(CourseStatus::Published),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedStudent {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, deserialize_with = "de_opt_datetime")]
    pub completed_at: Option<DateTime<Utc>>,
}

// =========================================================
// 课时 (Lesson)
// =========================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub course_id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    /// 时长（秒）
    #[serde(default, deserialize_with = "de_number")]
    pub duration: f64,
    #[serde(default)]
    pub is_free: bool,
    #[serde(default)]
    pub order_index: Option<i64>,
}

impl Lesson {
    pub fn duration_minutes(&self) -> u64 {
        (self.duration.max(0.0) / 60.0).floor() as u64
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LessonDraft {
    pub course_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    pub duration: f64,
    pub is_free: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_index: Option<i64>,
}

// =========================================================
// 选课与进度 (Enrollment & Progress)
// =========================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub course_id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub user_id: Option<String>,
    /// 0-100
    #[serde(default, deserialize_with = "de_number")]
    pub progress: f64,
    #[serde(default, deserialize_with = "de_opt_datetime")]
    pub enrolled_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "de_opt_datetime")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "courses")]
    pub course: Option<Course>,
}

/// "我的课程" 列表中的条目：课程本身加上学习进度
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrolledCourse {
    #[serde(flatten)]
    pub course: Course,
    #[serde(default, deserialize_with = "de_number")]
    pub progress: f64,
    #[serde(default, deserialize_with = "de_number")]
    pub lesson_count: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LessonSummary {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "de_number")]
    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonProgress {
    #[serde(deserialize_with = "de_id")]
    pub lesson_id: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, deserialize_with = "de_number")]
    pub watched_duration: f64,
    #[serde(default)]
    pub lessons: Option<LessonSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CourseProgress {
    #[serde(default)]
    pub lessons_completed: u32,
    #[serde(default)]
    pub total_lessons: u32,
    #[serde(default, deserialize_with = "de_number")]
    pub overall_progress: f64,
    #[serde(default, deserialize_with = "de_opt_datetime")]
    pub enrolled_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "de_opt_datetime")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "de_list")]
    pub lesson_progress: Vec<LessonProgress>,
}

/// `POST /progress/update` 请求体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub lesson_id: String,
    pub course_id: String,
    pub watched_duration: u64,
    pub completed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressStats {
    #[serde(default, deserialize_with = "de_number")]
    pub total_courses: f64,
    #[serde(default, deserialize_with = "de_number")]
    pub completed_courses: f64,
    #[serde(default, deserialize_with = "de_number")]
    pub completion_rate: f64,
    #[serde(default, deserialize_with = "de_number")]
    pub total_quizzes: f64,
    #[serde(default, deserialize_with = "de_number")]
    pub average_score: f64,
    #[serde(default, deserialize_with = "de_number")]
    pub quiz_pass_rate: f64,
    #[serde(default, deserialize_with = "de_list")]
    pub enrollments: Vec<Enrollment>,
}

// =========================================================
// 测验 (Quiz)
// =========================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    #[serde(default)]
    pub question: String,
    #[serde(default, deserialize_with = "de_list")]
    pub options: Vec<String>,
    /// 正确选项的下标，只有讲师创建测验时才会携带
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub course_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "de_list")]
    pub questions: Vec<QuizQuestion>,
    #[serde(default, deserialize_with = "de_number")]
    pub passing_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizDraft {
    pub course_id: String,
    pub title: String,
    pub questions: Vec<QuizQuestion>,
    pub passing_score: f64,
}

/// 答案为所选选项下标的字符串形式，按题目顺序排列
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizSubmission {
    pub quiz_id: String,
    pub answers: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuizResult {
    #[serde(default, deserialize_with = "de_number")]
    pub score: f64,
    #[serde(default)]
    pub passed: bool,
    #[serde(default)]
    pub correct_answers: u32,
    #[serde(default)]
    pub total_questions: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizAttempt {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub quiz_id: Option<String>,
    #[serde(default, deserialize_with = "de_number")]
    pub score: f64,
    #[serde(default)]
    pub passed: bool,
    #[serde(default, deserialize_with = "de_opt_datetime")]
    pub created_at: Option<DateTime<Utc>>,
}

// =========================================================
// 支付、通知与管理 (Payment / Notification / Admin)
// =========================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub checkout_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub read: bool,
    #[serde(default, deserialize_with = "de_opt_datetime")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdminStats {
    #[serde(default, deserialize_with = "de_number")]
    pub users: f64,
    #[serde(default, deserialize_with = "de_number")]
    pub courses: f64,
    #[serde(default, deserialize_with = "de_number")]
    pub enrollments: f64,
    #[serde(default, deserialize_with = "de_number")]
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminUser {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default, deserialize_with = "de_opt_datetime")]
    pub created_at: Option<DateTime<Utc>>,
}
