//! 学生视图：我的课程、学习统计、课程进度与证书

use coursehub::service::certificates::Certificate;
use coursehub::service::learning::QuizGate;
use coursehub_shared::protocol::MyCourses;
use coursehub_shared::{CourseProgress, ProgressStats, QuizAttempt};
use leptos::prelude::*;

use crate::auth::use_auth;
use crate::components::common::{ErrorAlert, Load, Spinner, spawn_load};
use crate::web::download::save_text;
use crate::web::router::Link;

#[component]
pub fn MyCoursesPage() -> impl IntoView {
    let auth = use_auth();
    let (mine, set_mine) = signal(Load::<MyCourses>::Loading);
    spawn_load(set_mine, async move {
        let app = auth.app();
        app.my_courses().await
    });

    view! {
        <div class="max-w-5xl mx-auto p-4 md:p-8 space-y-6">
            <h1 class="text-3xl font-bold">"My Courses"</h1>
            {move || match mine.get() {
                Load::Loading => view! { <Spinner /> }.into_any(),
                Load::Failed(message) => view! { <ErrorAlert message=message /> }.into_any(),
                Load::Ready(mine) if mine.courses.is_empty() => view! {
                    <div class="text-center space-y-4 py-12">
                        <p>"You have not enrolled in any courses yet."</p>
                        <Link to="/courses" class="btn btn-primary">"Browse Courses"</Link>
                    </div>
                }.into_any(),
                Load::Ready(mine) => mine.courses.into_iter().map(|entry| {
                    let course = entry.course;
                    view! {
                        <div class="card bg-base-100 shadow p-4 space-y-2">
                            <div class="flex justify-between items-center">
                                <h2 class="text-xl font-semibold">{course.title.clone()}</h2>
                                <Link to=format!("/course/{}", course.id) class="btn btn-sm btn-primary">"Continue"</Link>
                            </div>
                            <progress class="progress progress-primary" value=entry.progress.to_string() max="100"></progress>
                            <p class="text-sm">
                                {format!("{:.0}% of {} lessons", entry.progress, entry.lesson_count)}
                            </p>
                            <Link to=format!("/progress/{}", course.id) class="link text-sm">"Details"</Link>
                        </div>
                    }
                }).collect_view().into_any(),
            }}
        </div>
    }
}

#[component]
fn StatCard(title: &'static str, #[prop(into)] value: String) -> impl IntoView {
    view! {
        <div class="stat">
            <div class="stat-title">{title}</div>
            <div class="stat-value text-primary">{value}</div>
        </div>
    }
}

#[component]
pub fn MyStatsPage() -> impl IntoView {
    let auth = use_auth();
    let (stats, set_stats) = signal(Load::<ProgressStats>::Loading);
    let (attempts, set_attempts) = signal(Load::<Vec<QuizAttempt>>::Loading);
    spawn_load(set_stats, async move {
        let app = auth.app();
        app.progress_stats().await
    });
    spawn_load(set_attempts, async move {
        let app = auth.app();
        app.my_quiz_attempts().await
    });

    view! {
        <div class="max-w-5xl mx-auto p-4 md:p-8 space-y-6">
            <h1 class="text-3xl font-bold">"My Progress"</h1>
            {move || match stats.get() {
                Load::Loading => view! { <Spinner /> }.into_any(),
                Load::Failed(message) => view! { <ErrorAlert message=message /> }.into_any(),
                Load::Ready(s) => view! {
                    <div class="stats shadow w-full stats-vertical md:stats-horizontal bg-base-100">
                        <StatCard title="Enrolled" value=format!("{}", s.total_courses) />
                        <StatCard title="Completed" value=format!("{}", s.completed_courses) />
                        <StatCard title="Completion Rate" value=format!("{:.0}%", s.completion_rate) />
                        <StatCard title="Average Quiz Score" value=format!("{:.0}%", s.average_score) />
                        <StatCard title="Quiz Pass Rate" value=format!("{:.0}%", s.quiz_pass_rate) />
                    </div>
                }.into_any(),
            }}
            <h2 class="text-2xl font-semibold">"Quiz Attempts"</h2>
            {move || match attempts.get() {
                Load::Loading => view! { <Spinner /> }.into_any(),
                Load::Failed(message) => view! { <ErrorAlert message=message /> }.into_any(),
                Load::Ready(list) => view! {
                    <table class="table bg-base-100">
                        <thead><tr><th>"Date"</th><th>"Score"</th><th>"Result"</th></tr></thead>
                        <tbody>
                            {list.into_iter().map(|a| view! {
                                <tr>
                                    <td>{a.created_at.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default()}</td>
                                    <td>{format!("{:.0}%", a.score)}</td>
                                    <td>{if a.passed { "Passed" } else { "Failed" }}</td>
                                </tr>
                            }).collect_view()}
                        </tbody>
                    </table>
                }.into_any(),
            }}
        </div>
    }
}

#[component]
pub fn CourseProgressPage(course_id: String) -> impl IntoView {
    let auth = use_auth();
    let (progress, set_progress) = signal(Load::<(CourseProgress, QuizGate)>::Loading);
    let id = course_id.clone();
    spawn_load(set_progress, async move {
        let app = auth.app();
        app.refresh_course_progress(&id).await
    });

    view! {
        <div class="max-w-4xl mx-auto p-4 md:p-8 space-y-6">
            <Link to=format!("/course/{}", course_id) class="link">"Back to course"</Link>
            {move || match progress.get() {
                Load::Loading => view! { <Spinner /> }.into_any(),
                Load::Failed(message) => view! { <ErrorAlert message=message /> }.into_any(),
                Load::Ready((p, gate)) => view! {
                    <div class="space-y-4">
                        <h1 class="text-3xl font-bold">"Course Progress"</h1>
                        <progress class="progress progress-primary" value=p.overall_progress.to_string() max="100"></progress>
                        <p>{format!("{} of {} lessons completed", p.lessons_completed, p.total_lessons)}</p>
                        <p class="text-sm">
                            {if gate.is_unlocked() { "Quiz unlocked" } else { "Quiz locked until all lessons are completed" }}
                        </p>
                        <ul class="space-y-2">
                            {p.lesson_progress.into_iter().map(|lp| {
                                let title = lp.lessons.as_ref().and_then(|l| l.title.clone()).unwrap_or(lp.lesson_id.clone());
                                let (badge, label) = if lp.completed {
                                    ("badge badge-success", "Completed")
                                } else {
                                    ("badge", "In progress")
                                };
                                view! {
                                    <li class="flex justify-between p-3 bg-base-100 rounded-box">
                                        <span>{title}</span>
                                        <span class=badge>{label}</span>
                                    </li>
                                }
                            }).collect_view()}
                        </ul>
                    </div>
                }.into_any(),
            }}
        </div>
    }
}

fn download(certificate: &Certificate) {
    if let Err(e) = save_text(&certificate.file_name(), "text/html", &certificate.render_html()) {
        log::error!("certificate download failed: {:?}", e);
    }
}

#[component]
pub fn CertificatesPage() -> impl IntoView {
    let auth = use_auth();
    let (certificates, set_certificates) = signal(Load::<Vec<Certificate>>::Loading);
    spawn_load(set_certificates, async move {
        let app = auth.app();
        app.certificates().await
    });

    view! {
        <div class="max-w-4xl mx-auto p-4 md:p-8 space-y-6">
            <h1 class="text-3xl font-bold">"My Certificates"</h1>
            {move || match certificates.get() {
                Load::Loading => view! { <Spinner /> }.into_any(),
                Load::Failed(message) => view! { <ErrorAlert message=message /> }.into_any(),
                Load::Ready(list) if list.is_empty() => view! {
                    <p>"Complete a free course to earn your first certificate."</p>
                }.into_any(),
                Load::Ready(list) => list.into_iter().map(|certificate| view! {
                    <div class="card bg-base-100 shadow p-4 flex-row justify-between items-center">
                        <div>
                            <h2 class="text-xl font-semibold">{certificate.course_title.clone()}</h2>
                            <p class="text-sm">{format!("Completed on {}", certificate.completed_on())}</p>
                        </div>
                        <button class="btn btn-primary" on:click=move |_| download(&certificate)>
                            "Download"
                        </button>
                    </div>
                }).collect_view().into_any(),
            }}
        </div>
    }
}
