//! 结业证书
//!
//! 只为已完成（进度 100 且有完成时间）的免费课程生成证书。
//! 证书以独立 HTML 文件形式下载，内容完全在本地渲染。

use chrono::{DateTime, Utc};

use crate::context::AppContext;
use crate::error::ApiResult;
use crate::request::HttpClient;
use coursehub_shared::Enrollment;

#[derive(Debug, Clone, PartialEq)]
pub struct Certificate {
    pub course_id: Option<String>,
    pub course_title: String,
    pub holder: String,
    pub completed_at: DateTime<Utc>,
    pub score: f64,
}

/// 选课记录是否可以领取证书；缺少课程信息时不能判断价格，视为不可领取
pub fn is_eligible(enrollment: &Enrollment) -> bool {
    enrollment.progress == 100.0
        && enrollment.completed_at.is_some()
        && enrollment.course.as_ref().is_some_and(|c| c.is_free())
}

pub fn eligible_certificates(enrollments: &[Enrollment], holder: &str) -> Vec<Certificate> {
    enrollments
        .iter()
        .filter(|e| is_eligible(e))
        .filter_map(|e| {
            let course = e.course.as_ref()?;
            Some(Certificate {
                course_id: e.course_id.clone().or_else(|| Some(course.id.clone())),
                course_title: course.title.clone(),
                holder: holder.to_string(),
                completed_at: e.completed_at?,
                score: e.progress,
            })
        })
        .collect()
}

impl Certificate {
    /// 标题中只保留字母、数字、空格、`-` 和 `_`，其余字符替换为 `_`
    pub fn file_name(&self) -> String {
        let title: String = self
            .course_title
            .trim()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        if title.is_empty() {
            "certificate-course.html".to_string()
        } else {
            format!("certificate-{}.html", title)
        }
    }

    pub fn completed_on(&self) -> String {
        self.completed_at.format("%Y-%m-%d").to_string()
    }

    pub fn render_html(&self) -> String {
        let title = escape_html(&self.course_title);
        let holder = escape_html(&self.holder);
        format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Certificate of Completion</title>
<style>
body {{ font-family: Arial, sans-serif; margin: 0; padding: 40px; }}
.certificate {{ text-align: center; border: 5px solid #1976d2; padding: 60px 40px; max-width: 800px; margin: 0 auto; }}
.title {{ color: #1976d2; font-size: 48px; }}
.name {{ font-size: 36px; text-decoration: underline; }}
.course {{ font-size: 28px; color: #1976d2; font-weight: bold; }}
</style>
</head>
<body>
<div class="certificate">
<h1 class="title">Certificate of Completion</h1>
<p>This is to certify that</p>
<h2 class="name">{holder}</h2>
<p>has successfully completed the course</p>
<h3 class="course">{title}</h3>
<p>Completion Date: {date}</p>
<p>Final Score: {score}%</p>
</div>
</body>
</html>
"#,
            holder = holder,
            title = title,
            date = self.completed_on(),
            score = self.score,
        )
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

impl<C: HttpClient + 'static> AppContext<C> {
    /// 基于 "我的课程" 中的选课记录
    pub async fn certificates(&self) -> ApiResult<Vec<Certificate>> {
        let user = self.session.require_user()?;
        let mine = self
            .my_courses()
            .await
            .map_err(|e| e.in_op("certificates.list"))?;
        Ok(eligible_certificates(&mine.enrollments, &user.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::Harness;
    use coursehub_shared::{HttpMethod, Role};
    use serde_json::json;

    fn enrollment(progress: f64, completed: bool, price: Option<f64>) -> Enrollment {
        let completed_at = if completed {
            json!("2024-05-01T10:00:00Z")
        } else {
            json!(null)
        };
        let mut value = json!({
            "course_id": "c1",
            "progress": progress,
            "completed_at": completed_at,
        });
        if let Some(price) = price {
            value["courses"] = json!({"id": "c1", "title": "Rust <Basics>", "price": price});
        }
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_eligibility_requires_all_three_conditions() {
        assert!(is_eligible(&enrollment(100.0, true, Some(0.0))));
        assert!(!is_eligible(&enrollment(99.0, true, Some(0.0))));
        assert!(!is_eligible(&enrollment(100.0, false, Some(0.0))));
        assert!(!is_eligible(&enrollment(100.0, true, Some(10.0))));
        assert!(!is_eligible(&enrollment(100.0, true, None)));
    }

    #[test]
    fn test_course_without_price_gets_no_certificate() {
        let enrollment: Enrollment = serde_json::from_value(json!({
            "course_id": "c1",
            "progress": 100,
            "completed_at": "2024-05-01T10:00:00Z",
            "courses": {"id": "c1", "title": "Rust"}
        }))
        .unwrap();
        assert!(!is_eligible(&enrollment));
        assert!(eligible_certificates(&[enrollment], "Ada").is_empty());
    }

    #[test]
    fn test_file_name_replaces_unsafe_characters() {
        let mut cert = eligible_certificates(&[enrollment(100.0, true, Some(0.0))], "Ada").remove(0);
        cert.course_title = "a/b\\c: d?".to_string();
        assert_eq!(cert.file_name(), "certificate-a_b_c_ d_.html");

        cert.course_title = "   ".to_string();
        assert_eq!(cert.file_name(), "certificate-course.html");
    }

    #[test]
    fn test_certificate_rendering() {
        let certs = eligible_certificates(&[enrollment(100.0, true, Some(0.0))], "Ada");
        assert_eq!(certs.len(), 1);

        let cert = &certs[0];
        assert_eq!(cert.file_name(), "certificate-Rust _Basics_.html");
        assert_eq!(cert.completed_on(), "2024-05-01");

        let html = cert.render_html();
        assert!(html.contains("Rust &lt;Basics&gt;"));
        assert!(html.contains("<h2 class=\"name\">Ada</h2>"));
        assert!(html.contains("Final Score: 100%"));
    }

    #[tokio::test]
    async fn test_certificates_from_my_courses() {
        let h = Harness::new();
        h.sign_in(Role::Student);
        h.mock_ok(
            HttpMethod::Get,
            "/enrollment/my-courses",
            json!({
                "courses": [],
                "enrollments": [
                    {"course_id": "c1", "progress": 100, "completed_at": "2024-05-01T10:00:00", "courses": {"id": "c1", "title": "Free", "price": "0"}},
                    {"course_id": "c2", "progress": 100, "completed_at": "2024-05-02T10:00:00", "courses": {"id": "c2", "title": "Paid", "price": "19.99"}},
                    {"course_id": "c3", "progress": 60, "courses": {"id": "c3", "title": "Half", "price": 0}}
                ]
            }),
        );

        let certs = h.ctx.certificates().await.unwrap();
        assert_eq!(certs.len(), 1);
        assert_eq!(certs[0].course_title, "Free");
        assert_eq!(certs[0].holder, "Test User");
    }
}
