//! 首页、课程目录与课程详情

use std::time::Duration;

use coursehub::service::catalog::{CourseDetail, CourseFilters, SortOrder, categories};
use coursehub::service::enrollment::{EnrollOutcome, PaymentReturn};
use coursehub::service::learning::{COMPLETION_THRESHOLD, QuizGate, WatchOutcome, watched_fraction};
use coursehub_shared::{Course, Lesson, Quiz, QuizResult};
use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::auth::use_auth;
use crate::components::common::{
    ErrorAlert, ErrorBanner, Load, NotFound, Spinner, format_price, report, spawn_load,
};
use crate::web::router::{Link, use_router};
use crate::web::timer::set_timeout;

/// 支付成功页停留时间
const PAYMENT_REDIRECT_DELAY: Duration = Duration::from_secs(5);

#[component]
fn CourseCard(course: Course) -> impl IntoView {
    let href = format!("/course/{}", course.id);
    let instructor = course
        .instructor
        .as_ref()
        .map(|i| i.name.clone())
        .unwrap_or_default();

    view! {
        <div class="card bg-base-100 shadow-xl">
            {course.thumbnail_url.clone().map(|src| view! {
                <figure><img src=src alt=course.title.clone() class="h-40 w-full object-cover" /></figure>
            })}
            <div class="card-body">
                <h2 class="card-title">{course.title.clone()}</h2>
                <p class="text-sm text-base-content/70 line-clamp-2">
                    {course.description.clone().unwrap_or_default()}
                </p>
                <div class="flex items-center justify-between text-sm">
                    <span>{instructor}</span>
                    <span class="badge badge-primary">{format_price(course.price)}</span>
                </div>
                <div class="card-actions justify-end">
                    <Link to=href class="btn btn-sm btn-primary">"View Course"</Link>
                </div>
            </div>
        </div>
    }
}

#[component]
fn CourseGrid(courses: Vec<Course>) -> impl IntoView {
    if courses.is_empty() {
        return view! { <p class="text-center py-12">"No courses found"</p> }.into_any();
    }
    view! {
        <div class="grid gap-6 md:grid-cols-2 lg:grid-cols-3">
            {courses.into_iter().map(|course| view! { <CourseCard course=course /> }).collect_view()}
        </div>
    }
    .into_any()
}

#[component]
pub fn HomePage() -> impl IntoView {
    let auth = use_auth();
    let (courses, set_courses) = signal(Load::<Vec<Course>>::Loading);
    spawn_load(set_courses, async move {
        let app = auth.app();
        app.browse(&CourseFilters::default()).await
    });

    view! {
        <div class="max-w-7xl mx-auto p-4 md:p-8 space-y-8">
            <div class="hero bg-base-100 rounded-box py-12">
                <div class="hero-content text-center">
                    <div class="max-w-xl space-y-4">
                        <h1 class="text-5xl font-bold">"Learn anything, at your pace"</h1>
                        <Link to="/courses" class="btn btn-primary">"Browse Courses"</Link>
                    </div>
                </div>
            </div>
            <h2 class="text-2xl font-bold">"Latest Courses"</h2>
            {move || match courses.get() {
                Load::Loading => view! { <Spinner /> }.into_any(),
                Load::Failed(message) => view! { <ErrorAlert message=message /> }.into_any(),
                Load::Ready(list) => {
                    let latest: Vec<Course> = list.into_iter().take(6).collect();
                    view! { <CourseGrid courses=latest /> }.into_any()
                }
            }}
        </div>
    }
}

#[component]
pub fn CoursesPage() -> impl IntoView {
    let auth = use_auth();
    let (all, set_all) = signal(Load::<Vec<Course>>::Loading);
    let (filters, set_filters) = signal(CourseFilters::default());
    spawn_load(set_all, async move {
        let app = auth.app();
        app.all_courses().await
    });

    let loaded = Signal::derive(move || match all.get() {
        Load::Ready(list) => list,
        _ => Vec::new(),
    });

    view! {
        <div class="max-w-7xl mx-auto p-4 md:p-8 space-y-6">
            <div class="flex flex-wrap gap-4 items-end bg-base-100 p-4 rounded-box shadow">
                <input
                    type="search"
                    placeholder="Search courses"
                    class="input input-bordered"
                    prop:value=move || filters.get().search
                    on:input=move |ev| set_filters.update(|f| f.search = event_target_value(&ev))
                />
                <select
                    class="select select-bordered"
                    on:change=move |ev| {
                        let value = event_target_value(&ev);
                        set_filters.update(|f| f.category = (!value.is_empty()).then_some(value));
                    }
                >
                    <option value="">"All categories"</option>
                    {move || categories(&loaded.get())
                        .into_iter()
                        .map(|c| view! { <option value=c.clone()>{c.clone()}</option> })
                        .collect_view()}
                </select>
                <label class="label cursor-pointer gap-2">
                    <input
                        type="checkbox"
                        class="checkbox"
                        prop:checked=move || filters.get().free_only
                        on:change=move |ev| set_filters.update(|f| f.free_only = event_target_checked(&ev))
                    />
                    <span class="label-text">"Free only"</span>
                </label>
                <label class="form-control">
                    <span class="label-text">{move || format!("Max price: ${}", filters.get().price_range.1)}</span>
                    <input
                        type="range"
                        min="0"
                        max="200"
                        class="range range-sm"
                        prop:value=move || filters.get().price_range.1.to_string()
                        on:input=move |ev| {
                            let max = event_target_value(&ev).parse().unwrap_or(200.0);
                            set_filters.update(|f| f.price_range.1 = max);
                        }
                    />
                </label>
                <select
                    class="select select-bordered"
                    on:change=move |ev| {
                        let sort = event_target_value(&ev).parse::<SortOrder>().unwrap_or_default();
                        set_filters.update(|f| f.sort = sort);
                    }
                >
                    <option value="newest">"Newest"</option>
                    <option value="oldest">"Oldest"</option>
                    <option value="price_low">"Price: Low to High"</option>
                    <option value="price_high">"Price: High to Low"</option>
                    <option value="popular">"Most Popular"</option>
                </select>
            </div>
            {move || match all.get() {
                Load::Loading => view! { <Spinner /> }.into_any(),
                Load::Failed(message) => view! { <ErrorAlert message=message /> }.into_any(),
                Load::Ready(list) => {
                    let shown = filters.with(|f| f.apply(&list));
                    view! { <CourseGrid courses=shown /> }.into_any()
                }
            }}
        </div>
    }
}

// =========================================================
// 课程详情
// =========================================================

fn redirect_to(url: &str) {
    if let Some(window) = web_sys::window() {
        if let Err(e) = window.location().set_href(url) {
            log::error!("checkout redirect failed: {:?}", e);
        }
    }
}

#[component]
pub fn CourseDetailPage(id: String) -> impl IntoView {
    let auth = use_auth();
    let router = use_router();
    let course_id = StoredValue::new(id);

    let (detail, set_detail) = signal(Load::<CourseDetail>::Loading);
    let (not_found, set_not_found) = signal(false);
    let (gate, set_gate) = signal(Option::<QuizGate>::None);
    let (playing, set_playing) = signal(Option::<Lesson>::None);
    let (notice, set_notice) = signal(Option::<String>::None);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);
    let (enrolling, set_enrolling) = signal(false);

    let load = move || {
        let id = course_id.get_value();
        spawn_local(async move {
            let app = auth.app();
            let result = app.course_detail(&id).await;
            if matches!(&result, Err(e) if e.is_not_found()) {
                set_not_found.set(true);
            }
            let enrolled = matches!(&result, Ok(d) if d.enrolled);
            set_detail.set(Load::from(result));
            if enrolled {
                match app.quiz_gate(&id).await {
                    Ok(g) => set_gate.set(Some(g)),
                    Err(e) => log::warn!("quiz gate unavailable: {}", e),
                }
            }
        });
    };

    // 完成课时后延迟刷新进度与测验解锁
    let refresh_progress = move || {
        let id = course_id.get_value();
        spawn_local(async move {
            let app = auth.app();
            match app.refresh_course_progress(&id).await {
                Ok((_, g)) => set_gate.set(Some(g)),
                Err(e) => log::error!("{}", e),
            }
        });
    };

    // 支付返回：消费查询参数后从地址栏移除
    let app = auth.app();
    let (payment, cleaned) =
        app.handle_payment_return(&course_id.get_value(), &router.location().get_untracked());
    if let Some(payment) = payment {
        router.replace(&cleaned);
        set_notice.set(Some(match payment {
            PaymentReturn::Success => "Payment successful! You are now enrolled.".to_string(),
            PaymentReturn::Cancelled => "Payment was cancelled.".to_string(),
        }));
    }
    load();

    let on_enroll = move |course: Course| {
        if !auth.viewer_signal().get_untracked().is_authenticated() {
            router.navigate("/login");
            return;
        }
        set_enrolling.set(true);
        spawn_local(async move {
            let app = auth.app();
            match report(app.enroll(&course).await, set_error_msg) {
                Some(EnrollOutcome::Enrolled) => {
                    set_notice.set(Some("You are enrolled!".to_string()));
                    load();
                }
                Some(EnrollOutcome::Checkout { url }) => redirect_to(&url),
                None => {}
            }
            set_enrolling.set(false);
        });
    };

    let on_timeupdate = move |ev: web_sys::Event, lesson_id: String| {
        let video = event_target::<web_sys::HtmlVideoElement>(&ev);
        let (current_time, duration) = (video.current_time(), video.duration());
        if watched_fraction(current_time, duration) <= COMPLETION_THRESHOLD {
            return;
        }
        let id = course_id.get_value();
        spawn_local(async move {
            let app = auth.app();
            match app.record_watch(&id, &lesson_id, current_time, duration).await {
                Ok(WatchOutcome::Completed { refetch_after }) => {
                    set_notice.set(Some("Lesson completed!".to_string()));
                    set_timeout(refetch_after, refresh_progress);
                }
                Ok(_) => {}
                Err(e) => log::error!("{}", e),
            }
        });
    };

    view! {
        <div class="max-w-5xl mx-auto p-4 md:p-8 space-y-6">
            {move || notice.get().map(|message| view! {
                <div role="status" class="alert alert-info text-sm py-2"><span>{message}</span></div>
            })}
            <ErrorBanner error=error_msg />
            {move || {
                if not_found.get() {
                    return view! { <NotFound message="Course not found" /> }.into_any();
                }
                match detail.get() {
                    Load::Loading => view! { <Spinner /> }.into_any(),
                    Load::Failed(message) => view! { <ErrorAlert message=message /> }.into_any(),
                    Load::Ready(d) => {
                        let course = d.course.clone();
                        let minutes = (d.total_duration_secs() / 60.0).round();
                        let lessons = d.lessons.iter().map(|lesson| {
                            let playable = d.can_play(lesson);
                            let item = lesson.clone();
                            view! {
                                <li class="flex justify-between items-center p-3 bg-base-100 rounded-box">
                                    <span>{lesson.title.clone()}</span>
                                    <span class="text-sm">{format!("{} min", lesson.duration_minutes())}</span>
                                    {if playable {
                                        view! {
                                            <button class="btn btn-xs btn-primary" on:click=move |_| set_playing.set(Some(item.clone()))>
                                                "Play"
                                            </button>
                                        }.into_any()
                                    } else {
                                        view! { <span class="badge">"Locked"</span> }.into_any()
                                    }}
                                </li>
                            }
                        }).collect_view();

                        view! {
                            <div class="space-y-4">
                                <h1 class="text-4xl font-bold">{course.title.clone()}</h1>
                                <p>{course.description.clone().unwrap_or_default()}</p>
                                <div class="flex gap-4 items-center">
                                    <span class="badge badge-lg badge-primary">{format_price(course.price)}</span>
                                    <span>{format!("{} lessons, {} min", d.lessons.len(), minutes)}</span>
                                    {(!d.enrolled).then(|| {
                                        let course = course.clone();
                                        view! {
                                            <button
                                                class="btn btn-primary"
                                                disabled=move || enrolling.get()
                                                on:click=move |_| on_enroll(course.clone())
                                            >
                                                {if course.is_free() { "Enroll for Free" } else { "Buy Now" }}
                                            </button>
                                        }
                                    })}
                                    {d.enrolled.then(|| view! {
                                        <Link to=format!("/progress/{}", course.id) class="btn btn-outline">"View Progress"</Link>
                                    })}
                                </div>
                                {move || playing.get().map(|lesson| {
                                    let lesson_id = lesson.id.clone();
                                    view! {
                                        <div class="space-y-2">
                                            <h2 class="text-xl font-semibold">{lesson.title.clone()}</h2>
                                            <video
                                                class="w-full rounded-box"
                                                controls
                                                src=lesson.video_url.clone().unwrap_or_default()
                                                on:timeupdate=move |ev| on_timeupdate(ev, lesson_id.clone())
                                            ></video>
                                        </div>
                                    }
                                })}
                                <ul class="space-y-2">{lessons}</ul>
                                {move || gate.get().map(|g| {
                                    if g.is_unlocked() {
                                        view! { <QuizPanel course_id=course_id.get_value() /> }.into_any()
                                    } else {
                                        view! {
                                            <div class="alert">
                                                {format!(
                                                    "Complete all lessons to unlock the quiz ({}/{}, {:.0}%)",
                                                    g.completed, g.total, g.percent()
                                                )}
                                            </div>
                                        }.into_any()
                                    }
                                })}
                            </div>
                        }.into_any()
                    }
                }
            }}
        </div>
    }
}

#[component]
fn QuizPanel(course_id: String) -> impl IntoView {
    let auth = use_auth();
    let (quiz, set_quiz) = signal(Load::<Option<Quiz>>::Loading);
    let (answers, set_answers) = signal(Vec::<Option<usize>>::new());
    let (result, set_result) = signal(Option::<QuizResult>::None);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);

    spawn_local(async move {
        let app = auth.app();
        let loaded = app.quiz(&course_id).await;
        if let Ok(Some(q)) = &loaded {
            set_answers.set(vec![None; q.questions.len()]);
        }
        set_quiz.set(Load::from(loaded));
    });

    let submit = move |quiz: Quiz| {
        let chosen = answers.get_untracked();
        spawn_local(async move {
            let app = auth.app();
            if let Some(r) = report(app.submit_quiz(&quiz, &chosen).await, set_error_msg) {
                set_result.set(Some(r));
            }
        });
    };

    move || match quiz.get() {
        Load::Loading => view! { <Spinner /> }.into_any(),
        Load::Failed(message) => view! { <ErrorAlert message=message /> }.into_any(),
        Load::Ready(None) => view! { <p>"This course has no quiz yet."</p> }.into_any(),
        Load::Ready(Some(q)) => {
            if let Some(r) = result.get() {
                let verdict = if r.passed { "Passed" } else { "Not passed" };
                return view! {
                    <div class="alert">
                        {format!(
                            "{}: {:.0}% ({}/{} correct)",
                            verdict, r.score, r.correct_answers, r.total_questions
                        )}
                    </div>
                }
                .into_any();
            }
            let questions = q.questions.iter().enumerate().map(|(qi, question)| {
                let options = question.options.iter().enumerate().map(|(oi, option)| view! {
                    <label class="label cursor-pointer justify-start gap-2">
                        <input
                            type="radio"
                            class="radio"
                            name=format!("question-{}", qi)
                            prop:checked=move || answers.with(|a| a.get(qi).copied().flatten() == Some(oi))
                            on:change=move |_| set_answers.update(|a| {
                                if let Some(slot) = a.get_mut(qi) {
                                    *slot = Some(oi);
                                }
                            })
                        />
                        <span>{option.clone()}</span>
                    </label>
                }).collect_view();
                view! {
                    <div class="space-y-1">
                        <p class="font-semibold">{format!("{}. {}", qi + 1, question.question)}</p>
                        {options}
                    </div>
                }
            }).collect_view();
            let title = q.title.clone().unwrap_or_else(|| "Course Quiz".to_string());
            let pass = q.passing_score;
            view! {
                <div class="card bg-base-100 shadow p-6 space-y-4">
                    <h2 class="text-2xl font-bold">{title}</h2>
                    <p class="text-sm">{format!("Passing score: {:.0}%", pass)}</p>
                    <ErrorBanner error=error_msg />
                    {questions}
                    <button class="btn btn-primary" on:click=move |_| submit(q.clone())>"Submit Quiz"</button>
                </div>
            }
            .into_any()
        }
    }
}

#[component]
pub fn PaymentSuccessPage() -> impl IntoView {
    let router = use_router();
    set_timeout(PAYMENT_REDIRECT_DELAY, move || router.navigate("/courses"));

    view! {
        <div class="hero py-24">
            <div class="hero-content text-center">
                <div class="space-y-4">
                    <h1 class="text-4xl font-bold text-success">"Payment Successful!"</h1>
                    <p>"Redirecting you to the course list..."</p>
                    <Link to="/my-courses" class="btn btn-primary">"Go to My Courses"</Link>
                </div>
            </div>
        </div>
    }
}
