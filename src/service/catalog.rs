//! 课程目录与课程详情

use std::cmp::Ordering;
use std::str::FromStr;

use crate::cache::keys;
use crate::context::AppContext;
use crate::error::ApiResult;
use crate::request::HttpClient;
use coursehub_shared::protocol::{
    CheckEnrollmentRequest, CourseLessonsRequest, GetCourseRequest, ListCoursesRequest,
};
use coursehub_shared::{Course, Lesson};

// =========================================================
// 筛选与排序 (本地派生)
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    PriceLow,
    PriceHigh,
    /// 暂无热度数据，与 Newest 相同
    Popular,
}

impl FromStr for SortOrder {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest" => Ok(SortOrder::Newest),
            "oldest" => Ok(SortOrder::Oldest),
            "price_low" => Ok(SortOrder::PriceLow),
            "price_high" => Ok(SortOrder::PriceHigh),
            "popular" => Ok(SortOrder::Popular),
            _ => Err(()),
        }
    }
}

pub const DEFAULT_PRICE_RANGE: (f64, f64) = (0.0, 200.0);

#[derive(Debug, Clone, PartialEq)]
pub struct CourseFilters {
    /// 在标题与简介中匹配，不区分大小写
    pub search: String,
    pub category: Option<String>,
    pub free_only: bool,
    /// 闭区间
    pub price_range: (f64, f64),
    pub sort: SortOrder,
}

impl Default for CourseFilters {
    fn default() -> Self {
        Self {
            search: String::new(),
            category: None,
            free_only: false,
            price_range: DEFAULT_PRICE_RANGE,
            sort: SortOrder::default(),
        }
    }
}

impl CourseFilters {
    pub fn matches(&self, course: &Course) -> bool {
        let needle = self.search.trim().to_lowercase();
        if !needle.is_empty() {
            let in_title = course.title.to_lowercase().contains(&needle);
            let in_description = course
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle));
            if !in_title && !in_description {
                return false;
            }
        }

        if let Some(category) = self.category.as_deref().filter(|c| !c.is_empty()) {
            if course.category.as_deref() != Some(category) {
                return false;
            }
        }

        if self.free_only && !course.is_free() {
            return false;
        }

        // 价格未知的课程无法按区间比较，不被区间过滤掉
        let (min, max) = self.price_range;
        course.price.is_none_or(|price| price >= min && price <= max)
    }

    pub fn apply(&self, courses: &[Course]) -> Vec<Course> {
        let mut filtered: Vec<Course> = courses.iter().filter(|c| self.matches(c)).cloned().collect();

        // 稳定排序，缺少创建时间的课程视为最早
        match self.sort {
            SortOrder::PriceLow => filtered.sort_by(|a, b| cmp_price(a, b, false)),
            SortOrder::PriceHigh => filtered.sort_by(|a, b| cmp_price(a, b, true)),
            SortOrder::Oldest => filtered.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            SortOrder::Newest | SortOrder::Popular => {
                filtered.sort_by(|a, b| b.created_at.cmp(&a.created_at))
            }
        }
        filtered
    }
}

/// 价格未知的课程两种方向都排在最后
fn cmp_price(a: &Course, b: &Course, descending: bool) -> Ordering {
    match (a.price, b.price) {
        (Some(x), Some(y)) => {
            let ord = x.partial_cmp(&y).unwrap_or(Ordering::Equal);
            if descending { ord.reverse() } else { ord }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// 目录中出现过的分类，去重排序
pub fn categories(courses: &[Course]) -> Vec<String> {
    let mut categories: Vec<String> = courses
        .iter()
        .filter_map(|c| c.category.clone())
        .filter(|c| !c.is_empty())
        .collect();
    categories.sort();
    categories.dedup();
    categories
}

// =========================================================
// 课程详情
// =========================================================

#[derive(Debug, Clone, PartialEq)]
pub struct CourseDetail {
    pub course: Course,
    pub lessons: Vec<Lesson>,
    /// 未登录时为 false
    pub enrolled: bool,
}

impl CourseDetail {
    /// 已选课，或课时标记为免费试看
    pub fn can_play(&self, lesson: &Lesson) -> bool {
        super::learning::lesson_playable(lesson, self.enrolled)
    }

    pub fn total_duration_secs(&self) -> f64 {
        self.lessons.iter().map(|l| l.duration).sum()
    }
}

impl<C: HttpClient + 'static> AppContext<C> {
    pub async fn all_courses(&self) -> ApiResult<Vec<Course>> {
        let api = self.api.clone();
        self.cache
            .get_as(keys::COURSES_ALL, move || async move {
                api.send(&ListCoursesRequest).await.map(|r| r.courses)
            })
            .await
            .map_err(|e| e.in_op("catalog.all_courses"))
    }

    pub async fn browse(&self, filters: &CourseFilters) -> ApiResult<Vec<Course>> {
        let courses = self.all_courses().await?;
        Ok(filters.apply(&courses))
    }

    /// 未知 id 返回 NotFound
    pub async fn course(&self, id: &str) -> ApiResult<Course> {
        let api = self.api.clone();
        let req = GetCourseRequest { id: id.to_string() };
        self.cache
            .get_as(&keys::course(id), move || async move {
                api.send(&req).await.map(|r| r.course)
            })
            .await
            .map_err(|e| e.in_op_with("catalog.course", id.to_string()))
    }

    pub async fn lessons(&self, course_id: &str) -> ApiResult<Vec<Lesson>> {
        let api = self.api.clone();
        let req = CourseLessonsRequest {
            course_id: course_id.to_string(),
        };
        self.cache
            .get_as(&keys::lessons(course_id), move || async move {
                let mut lessons = api.send(&req).await?.lessons;
                lessons.sort_by_key(|l| l.order_index.unwrap_or(i64::MAX));
                Ok(lessons)
            })
            .await
            .map_err(|e| e.in_op_with("catalog.lessons", course_id.to_string()))
    }

    pub async fn is_enrolled(&self, course_id: &str) -> ApiResult<bool> {
        let Some(user) = self.session.user() else {
            return Ok(false);
        };
        let api = self.api.clone();
        let req = CheckEnrollmentRequest {
            course_id: course_id.to_string(),
        };
        self.cache
            .get_as(&keys::enrollment(course_id, &user.id), move || async move {
                api.send(&req).await.map(|r| r.enrolled)
            })
            .await
            .map_err(|e| e.in_op_with("catalog.is_enrolled", course_id.to_string()))
    }

    /// 课程、课时与选课状态并发请求
    pub async fn course_detail(&self, id: &str) -> ApiResult<CourseDetail> {
        let (course, lessons, enrolled) =
            futures::join!(self.course(id), self.lessons(id), self.is_enrolled(id));
        Ok(CourseDetail {
            course: course?,
            lessons: lessons?,
            enrolled: enrolled?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::{Harness, course_json};
    use coursehub_shared::{HttpMethod, Role};
    use serde_json::json;

    fn sample_courses() -> Vec<Course> {
        serde_json::from_value(json!([
            {"id": "1", "title": "Intro to Rust", "description": "Ownership", "price": 0, "category": "Programming", "created_at": "2024-01-01T00:00:00Z"},
            {"id": "2", "title": "Watercolor", "description": "Painting RUST tones", "price": "49.5", "category": "Art", "created_at": "2024-03-01T00:00:00Z"},
            {"id": "3", "title": "Advanced Go", "description": null, "price": 250, "category": "Programming", "created_at": "2024-02-01T00:00:00Z"},
            {"id": "4", "title": "SQL", "price": "19", "category": "Data"}
        ]))
        .unwrap()
    }

    fn ids(courses: &[Course]) -> Vec<&str> {
        courses.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_default_filters_drop_out_of_range_and_sort_newest() {
        let result = CourseFilters::default().apply(&sample_courses());
        assert_eq!(ids(&result), vec!["2", "1", "4"]);
    }

    #[test]
    fn test_search_is_case_insensitive_over_title_and_description() {
        let filters = CourseFilters {
            search: "rust".into(),
            ..Default::default()
        };
        assert_eq!(ids(&filters.apply(&sample_courses())), vec!["2", "1"]);
    }

    #[test]
    fn test_category_free_only_and_sorting() {
        let courses = sample_courses();

        let filters = CourseFilters {
            category: Some("Programming".into()),
            price_range: (0.0, 1000.0),
            sort: SortOrder::PriceHigh,
            ..Default::default()
        };
        assert_eq!(ids(&filters.apply(&courses)), vec!["3", "1"]);

        let filters = CourseFilters {
            free_only: true,
            ..Default::default()
        };
        assert_eq!(ids(&filters.apply(&courses)), vec!["1"]);

        let filters = CourseFilters {
            sort: SortOrder::PriceLow,
            ..Default::default()
        };
        assert_eq!(ids(&filters.apply(&courses)), vec!["1", "4", "2"]);

        let filters = CourseFilters {
            sort: SortOrder::Oldest,
            ..Default::default()
        };
        assert_eq!(ids(&filters.apply(&courses)), vec!["4", "1", "2"]);
    }

    #[test]
    fn test_unknown_price_is_kept_but_never_free() {
        let mut courses = sample_courses();
        courses.push(
            serde_json::from_value(json!({"id": "5", "title": "Mystery", "price": null, "category": "Data"}))
                .unwrap(),
        );

        let free = CourseFilters {
            free_only: true,
            ..Default::default()
        };
        assert_eq!(ids(&free.apply(&courses)), vec!["1"]);

        let low = CourseFilters {
            sort: SortOrder::PriceLow,
            ..Default::default()
        };
        assert_eq!(ids(&low.apply(&courses)), vec!["1", "4", "2", "5"]);

        let high = CourseFilters {
            sort: SortOrder::PriceHigh,
            ..Default::default()
        };
        assert_eq!(ids(&high.apply(&courses)), vec!["2", "4", "1", "5"]);
    }

    #[test]
    fn test_popular_sorts_like_newest() {
        let courses = sample_courses();
        let newest = CourseFilters::default().apply(&courses);
        let popular = CourseFilters {
            sort: "popular".parse().unwrap(),
            ..Default::default()
        }
        .apply(&courses);
        assert_eq!(newest, popular);
    }

    #[test]
    fn test_categories() {
        assert_eq!(categories(&sample_courses()), vec!["Art", "Data", "Programming"]);
    }

    #[tokio::test]
    async fn test_all_courses_is_cached() {
        let h = Harness::new();
        h.mock_ok(HttpMethod::Get, "/courses", json!({"courses": [course_json("1", "Rust", json!(0))]}));

        let first = h.ctx.all_courses().await.unwrap();
        let second = h.ctx.browse(&CourseFilters::default()).await.unwrap();

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_eq!(h.count(HttpMethod::Get, "/courses"), 1);
    }

    #[tokio::test]
    async fn test_course_detail_for_anonymous_viewer() {
        let h = Harness::new();
        h.mock_ok(HttpMethod::Get, "/courses/c1", json!({"course": course_json("c1", "Rust", json!("29.99"))}));
        h.mock_ok(
            HttpMethod::Get,
            "/lessons/c1",
            json!({"lessons": [
                {"id": "l2", "title": "Second", "is_free": false, "order_index": 2, "duration": 300},
                {"id": "l1", "title": "First", "is_free": true, "order_index": 1, "duration": 120}
            ]}),
        );

        let detail = h.ctx.course_detail("c1").await.unwrap();

        assert!(!detail.enrolled);
        assert_eq!(detail.lessons[0].id, "l1");
        assert!(detail.can_play(&detail.lessons[0]));
        assert!(!detail.can_play(&detail.lessons[1]));
        assert_eq!(detail.total_duration_secs(), 420.0);
        assert_eq!(h.count(HttpMethod::Get, "/enrollment/check/c1"), 0);
    }

    #[tokio::test]
    async fn test_enrolled_student_can_play_everything() {
        let h = Harness::new();
        h.sign_in(Role::Student);
        h.mock_ok(HttpMethod::Get, "/courses/c1", json!({"course": course_json("c1", "Rust", json!(10))}));
        h.mock_ok(HttpMethod::Get, "/lessons/c1", json!({"lessons": [{"id": "l1", "is_free": false}]}));
        h.mock_ok(HttpMethod::Get, "/enrollment/check/c1", json!({"enrolled": true}));

        let detail = h.ctx.course_detail("c1").await.unwrap();
        assert!(detail.enrolled);
        assert!(detail.can_play(&detail.lessons[0]));
    }

    #[tokio::test]
    async fn test_unknown_course_is_not_found() {
        let h = Harness::new();
        h.mock(HttpMethod::Get, "/courses/nope", 404, json!({"error": "Course not found"}));
        h.mock_ok(HttpMethod::Get, "/lessons/nope", json!({"lessons": []}));

        let err = h.ctx.course_detail("nope").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.message(), "Course not found");
    }
}
