//! 讲师视图：课程列表、课程编辑器、测验编辑器

use coursehub::service::instructor::{InstructorStats, LessonForm, SaveReport};
use coursehub::service::media::VideoFile;
use coursehub_shared::{
    CompletedStudent, Course, CourseDraft, CoursePatch, CourseStatus, QuizDraft, QuizQuestion,
    Viewer,
};
use leptos::prelude::*;
use leptos::task::spawn_local;
use wasm_bindgen_futures::JsFuture;

use crate::auth::use_auth;
use crate::components::common::{
    ErrorAlert, ErrorBanner, Load, Spinner, format_price, query_param, report, spawn_load,
};
use crate::web::router::{Link, use_router};

#[component]
pub fn InstructorPage() -> impl IntoView {
    let auth = use_auth();
    let (courses, set_courses) = signal(Load::<Vec<Course>>::Loading);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);

    let load = move || {
        spawn_load(set_courses, async move {
            let app = auth.app();
            app.instructor_courses().await
        })
    };
    load();

    let publish = move |id: String| {
        spawn_local(async move {
            let app = auth.app();
            if report(app.publish_course(&id).await, set_error_msg).is_some() {
                load();
            }
        });
    };

    let delete = move |id: String| {
        spawn_local(async move {
            let app = auth.app();
            if report(app.delete_course(&id).await, set_error_msg).is_some() {
                set_courses.update(|state| {
                    if let Load::Ready(list) = state {
                        list.retain(|c| c.id != id);
                    }
                });
            }
        });
    };

    view! {
        <div class="max-w-6xl mx-auto p-4 md:p-8 space-y-6">
            <div class="flex justify-between items-center">
                <h1 class="text-3xl font-bold">"Instructor Dashboard"</h1>
                <Link to="/create-course" class="btn btn-primary">"Create Course"</Link>
            </div>
            <ErrorBanner error=error_msg />
            {move || match courses.get() {
                Load::Loading => view! { <Spinner /> }.into_any(),
                Load::Failed(message) => view! { <ErrorAlert message=message /> }.into_any(),
                Load::Ready(list) => {
                    let stats = InstructorStats::from_courses(&list);
                    view! {
                        <div class="stats shadow w-full bg-base-100">
                            <div class="stat"><div class="stat-title">"Courses"</div><div class="stat-value">{stats.total}</div></div>
                            <div class="stat"><div class="stat-title">"Published"</div><div class="stat-value">{stats.published}</div></div>
                            <div class="stat"><div class="stat-title">"Drafts"</div><div class="stat-value">{stats.drafts}</div></div>
                            <div class="stat"><div class="stat-title">"Students"</div><div class="stat-value">{format!("{}", stats.students)}</div></div>
                        </div>
                        <div class="space-y-4">
                            {list.into_iter().map(|course| {
                                let (publish_id, delete_id) = (course.id.clone(), course.id.clone());
                                let is_draft = course.status != Some(CourseStatus::Published);
                                view! {
                                    <div class="card bg-base-100 shadow p-4 space-y-2">
                                        <div class="flex justify-between items-center">
                                            <h2 class="text-xl font-semibold">{course.title.clone()}</h2>
                                            <span class="badge">{format_price(course.price)}</span>
                                        </div>
                                        <div class="flex flex-wrap gap-2">
                                            <Link to=format!("/create-course?edit={}", course.id) class="btn btn-sm">"Edit"</Link>
                                            <Link to=format!("/create-quiz/{}", course.id) class="btn btn-sm">"Add Quiz"</Link>
                                            {is_draft.then(|| view! {
                                                <button class="btn btn-sm btn-success" on:click=move |_| publish(publish_id.clone())>
                                                    "Publish"
                                                </button>
                                            })}
                                            <button class="btn btn-sm btn-error" on:click=move |_| delete(delete_id.clone())>
                                                "Delete"
                                            </button>
                                        </div>
                                        <CompletedStudents course_id=course.id.clone() />
                                    </div>
                                }
                            }).collect_view()}
                        </div>
                    }.into_any()
                }
            }}
        </div>
    }
}

/// 点击后才请求完成名单
#[component]
fn CompletedStudents(course_id: String) -> impl IntoView {
    let auth = use_auth();
    let (shown, set_shown) = signal(false);
    let (students, set_students) = signal(Load::<Vec<CompletedStudent>>::Loading);

    let on_show = move |_: web_sys::MouseEvent| {
        set_shown.set(true);
        let id = course_id.clone();
        spawn_load(set_students, async move {
            let app = auth.app();
            app.completed_students(&id).await
        });
    };

    move || {
        if !shown.get() {
            return view! {
                <button class="btn btn-xs btn-ghost" on:click=on_show.clone()>"Show completed students"</button>
            }
            .into_any();
        }
        match students.get() {
            Load::Loading => view! { <span class="loading loading-dots"></span> }.into_any(),
            Load::Failed(message) => view! { <ErrorAlert message=message /> }.into_any(),
            Load::Ready(list) if list.is_empty() => view! { <p class="text-sm">"No completions yet"</p> }.into_any(),
            Load::Ready(list) => view! {
                <ul class="text-sm list-disc pl-6">
                    {list.into_iter().map(|s| view! { <li>{format!("{} ({})", s.name, s.email)}</li> }).collect_view()}
                </ul>
            }
            .into_any(),
        }
    }
}

// =========================================================
// 课程编辑器
// =========================================================

fn report_summary(report: &SaveReport) -> String {
    let mut summary = format!("Saved {} lesson(s)", report.saved);
    if report.skipped > 0 {
        summary.push_str(&format!(", skipped {} incomplete", report.skipped));
    }
    if let Some(e) = &report.last_error {
        summary.push_str(&format!(", {} failed: {}", report.failed, e.message()));
    }
    summary
}

async fn read_file(file: web_sys::File) -> Result<VideoFile, String> {
    let buffer = JsFuture::from(file.array_buffer())
        .await
        .map_err(|e| format!("{:?}", e))?;
    let bytes = js_sys::Uint8Array::new(&buffer).to_vec();
    Ok(VideoFile {
        name: file.name(),
        mime_type: file.type_(),
        bytes,
    })
}

/// 新建与编辑共用；地址带 `?edit=<id>` 时为编辑模式
#[component]
pub fn CourseEditorPage() -> impl IntoView {
    let auth = use_auth();
    let router = use_router();
    let editing = query_param(&router.location().get_untracked(), "edit");
    let edit_id = StoredValue::new(editing.clone());

    let (draft, set_draft) = signal(CourseDraft::default());
    let (lessons, set_lessons) = signal(vec![LessonForm::default()]);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);
    let (summary, set_summary) = signal(Option::<String>::None);
    let (saving, set_saving) = signal(false);
    let (uploading, set_uploading) = signal(Option::<usize>::None);

    if let Some(id) = editing {
        spawn_local(async move {
            let app = auth.app();
            if let Some((course, forms)) = report(app.course_for_edit(&id).await, set_error_msg) {
                set_draft.set(CourseDraft {
                    title: course.title,
                    description: course.description.unwrap_or_default(),
                    price: course.price.unwrap_or_default(),
                    category: course.category.unwrap_or_default(),
                    thumbnail_url: course.thumbnail_url,
                });
                if !forms.is_empty() {
                    set_lessons.set(forms);
                }
            }
        });
    }

    let add_lesson = move |_: web_sys::MouseEvent| {
        set_lessons.update(|list| {
            list.push(LessonForm {
                order_index: list.len() as i64,
                ..Default::default()
            })
        })
    };

    let remove_lesson = move |index: usize| {
        let removed = lessons.with_untracked(|list| list.get(index).cloned());
        set_lessons.update(|list| {
            if index < list.len() {
                list.remove(index);
            }
        });
        // 已保存的课时同时从后端删除
        if let (Some(LessonForm { id: Some(lesson_id), .. }), Some(course_id)) =
            (removed, edit_id.get_value())
        {
            spawn_local(async move {
                let app = auth.app();
                report(app.delete_lesson(&lesson_id, &course_id).await, set_error_msg);
            });
        }
    };

    let upload = move |index: usize, file: web_sys::File| {
        set_uploading.set(Some(index));
        spawn_local(async move {
            let app = auth.app();
            let uploaded = match read_file(file).await {
                Ok(video) => app.upload_video(&video).await,
                Err(e) => Err(coursehub::ApiError::invalid_input(e)),
            };
            if let Some(video) = report(uploaded, set_error_msg) {
                set_lessons.update(|list| {
                    if let Some(lesson) = list.get_mut(index) {
                        lesson.video_url = video.public_url;
                    }
                });
            }
            set_uploading.set(None);
        });
    };

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        set_saving.set(true);
        let course = draft.get_untracked();
        let forms = lessons.get_untracked();
        spawn_local(async move {
            let app = auth.app();
            let result = match edit_id.get_value() {
                Some(id) => {
                    let patch = CoursePatch {
                        title: Some(course.title),
                        description: Some(course.description),
                        price: Some(course.price),
                        category: Some(course.category),
                        thumbnail_url: course.thumbnail_url,
                        status: None,
                    };
                    app.save_course_with_lessons(&id, patch, &forms).await
                }
                None => app.create_course_with_lessons(course, &forms).await,
            };
            if let Some(saved) = report(result, set_error_msg) {
                set_summary.set(Some(report_summary(&saved)));
                if saved.is_complete() {
                    let home = match auth.viewer_signal().get_untracked() {
                        Viewer::Admin => "/admin/courses",
                        _ => "/instructor",
                    };
                    router.navigate(home);
                } else if let Some(e) = &saved.last_error {
                    set_error_msg.set(Some(e.message().to_string()));
                }
            }
            set_saving.set(false);
        });
    };

    let text_input = move |placeholder: &'static str, get: fn(&CourseDraft) -> String, set: fn(&mut CourseDraft, String)| {
        view! {
            <input
                type="text"
                class="input input-bordered w-full"
                placeholder=placeholder
                prop:value=move || draft.with(get)
                on:input=move |ev| set_draft.update(|d| set(d, event_target_value(&ev)))
            />
        }
    };

    view! {
        <div class="max-w-4xl mx-auto p-4 md:p-8 space-y-6">
            <h1 class="text-3xl font-bold">
                {if edit_id.get_value().is_some() { "Edit Course" } else { "Create Course" }}
            </h1>
            <ErrorBanner error=error_msg />
            {move || summary.get().map(|s| view! { <div class="alert alert-info text-sm">{s}</div> })}
            <form class="card bg-base-100 shadow p-6 space-y-4" on:submit=on_submit>
                {text_input("Course title", |d| d.title.clone(), |d, v| d.title = v)}
                <textarea
                    class="textarea textarea-bordered w-full"
                    placeholder="Description"
                    prop:value=move || draft.with(|d| d.description.clone())
                    on:input=move |ev| set_draft.update(|d| d.description = event_target_value(&ev))
                ></textarea>
                {text_input("Category", |d| d.category.clone(), |d, v| d.category = v)}
                {text_input(
                    "Thumbnail URL",
                    |d| d.thumbnail_url.clone().unwrap_or_default(),
                    |d, v| d.thumbnail_url = (!v.trim().is_empty()).then_some(v),
                )}
                <input
                    type="number"
                    min="0"
                    step="0.01"
                    class="input input-bordered w-full"
                    placeholder="Price (0 for free)"
                    prop:value=move || draft.with(|d| d.price.to_string())
                    on:input=move |ev| {
                        let price = event_target_value(&ev).parse().unwrap_or(0.0);
                        set_draft.update(|d| d.price = price);
                    }
                />

                <h2 class="text-xl font-semibold">"Lessons"</h2>
                <For
                    each=move || 0..lessons.with(|l| l.len())
                    key=|index| *index
                    children=move |index| view! {
                        <div class="border rounded-box p-4 space-y-2">
                            <input
                                type="text"
                                class="input input-bordered w-full"
                                placeholder="Lesson title"
                                prop:value=move || lessons.with(|l| l.get(index).map(|x| x.title.clone()).unwrap_or_default())
                                on:input=move |ev| set_lessons.update(|l| {
                                    if let Some(x) = l.get_mut(index) { x.title = event_target_value(&ev); }
                                })
                            />
                            <textarea
                                class="textarea textarea-bordered w-full"
                                placeholder="Lesson description"
                                prop:value=move || lessons.with(|l| l.get(index).map(|x| x.description.clone()).unwrap_or_default())
                                on:input=move |ev| set_lessons.update(|l| {
                                    if let Some(x) = l.get_mut(index) { x.description = event_target_value(&ev); }
                                })
                            ></textarea>
                            <input
                                type="number"
                                min="0"
                                class="input input-bordered"
                                placeholder="Duration (minutes)"
                                prop:value=move || lessons.with(|l| l.get(index).map(|x| (x.duration / 60.0).to_string()).unwrap_or_default())
                                on:input=move |ev| {
                                    let minutes: f64 = event_target_value(&ev).parse().unwrap_or(0.0);
                                    set_lessons.update(|l| {
                                        if let Some(x) = l.get_mut(index) { x.duration = minutes * 60.0; }
                                    })
                                }
                            />
                            <label class="label cursor-pointer justify-start gap-2">
                                <input
                                    type="checkbox"
                                    class="checkbox"
                                    prop:checked=move || lessons.with(|l| l.get(index).is_some_and(|x| x.is_free))
                                    on:change=move |ev| set_lessons.update(|l| {
                                        if let Some(x) = l.get_mut(index) { x.is_free = event_target_checked(&ev); }
                                    })
                                />
                                <span class="label-text">"Free preview"</span>
                            </label>
                            <input
                                type="file"
                                accept="video/*"
                                class="file-input file-input-bordered w-full"
                                on:change=move |ev| {
                                    let input = event_target::<web_sys::HtmlInputElement>(&ev);
                                    if let Some(file) = input.files().and_then(|files| files.get(0)) {
                                        upload(index, file);
                                    }
                                }
                            />
                            {move || (uploading.get() == Some(index)).then(|| view! {
                                <span class="loading loading-spinner"></span>
                            })}
                            <p class="text-xs break-all">
                                {move || lessons.with(|l| l.get(index).map(|x| x.video_url.clone()).unwrap_or_default())}
                            </p>
                            <button type="button" class="btn btn-xs btn-error" on:click=move |_| remove_lesson(index)>
                                "Remove"
                            </button>
                        </div>
                    }
                />
                <button type="button" class="btn btn-outline" on:click=add_lesson>"Add Lesson"</button>
                <button class="btn btn-primary" disabled=move || saving.get() || uploading.get().is_some()>
                    "Save Course"
                </button>
            </form>
        </div>
    }
}

// =========================================================
// 测验编辑器
// =========================================================

const OPTIONS_PER_QUESTION: usize = 4;
const DEFAULT_PASSING_SCORE: f64 = 70.0;

fn blank_question() -> QuizQuestion {
    QuizQuestion {
        question: String::new(),
        options: vec![String::new(); OPTIONS_PER_QUESTION],
        correct_answer: Some(0),
    }
}

#[component]
pub fn CreateQuizPage(course_id: String) -> impl IntoView {
    let auth = use_auth();
    let router = use_router();
    let course_id = StoredValue::new(course_id);

    let (title, set_title) = signal(String::new());
    let (passing_score, set_passing_score) = signal(DEFAULT_PASSING_SCORE);
    let (questions, set_questions) = signal(vec![blank_question()]);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let draft = QuizDraft {
            course_id: course_id.get_value(),
            title: title.get_untracked(),
            questions: questions.get_untracked(),
            passing_score: passing_score.get_untracked(),
        };
        spawn_local(async move {
            let app = auth.app();
            if report(app.create_quiz(draft).await, set_error_msg).is_some() {
                router.navigate("/instructor");
            }
        });
    };

    view! {
        <div class="max-w-3xl mx-auto p-4 md:p-8 space-y-6">
            <h1 class="text-3xl font-bold">"Create Quiz"</h1>
            <ErrorBanner error=error_msg />
            <form class="card bg-base-100 shadow p-6 space-y-4" on:submit=on_submit>
                <input
                    type="text"
                    class="input input-bordered w-full"
                    placeholder="Quiz title"
                    prop:value=title
                    on:input=move |ev| set_title.set(event_target_value(&ev))
                />
                <label class="form-control">
                    <span class="label-text">"Passing score (%)"</span>
                    <input
                        type="number"
                        min="0"
                        max="100"
                        class="input input-bordered"
                        prop:value=move || passing_score.get().to_string()
                        on:input=move |ev| set_passing_score.set(event_target_value(&ev).parse().unwrap_or(DEFAULT_PASSING_SCORE))
                    />
                </label>
                <For
                    each=move || 0..questions.with(|q| q.len())
                    key=|qi| *qi
                    children=move |qi| view! {
                        <div class="border rounded-box p-4 space-y-2">
                            <input
                                type="text"
                                class="input input-bordered w-full"
                                placeholder=format!("Question {}", qi + 1)
                                prop:value=move || questions.with(|q| q.get(qi).map(|x| x.question.clone()).unwrap_or_default())
                                on:input=move |ev| set_questions.update(|q| {
                                    if let Some(x) = q.get_mut(qi) { x.question = event_target_value(&ev); }
                                })
                            />
                            {(0..OPTIONS_PER_QUESTION).map(|oi| view! {
                                <div class="flex items-center gap-2">
                                    <input
                                        type="radio"
                                        class="radio"
                                        name=format!("correct-{}", qi)
                                        prop:checked=move || questions.with(|q| q.get(qi).and_then(|x| x.correct_answer) == Some(oi))
                                        on:change=move |_| set_questions.update(|q| {
                                            if let Some(x) = q.get_mut(qi) { x.correct_answer = Some(oi); }
                                        })
                                    />
                                    <input
                                        type="text"
                                        class="input input-bordered input-sm flex-1"
                                        placeholder=format!("Option {}", oi + 1)
                                        prop:value=move || questions.with(|q| q.get(qi).and_then(|x| x.options.get(oi).cloned()).unwrap_or_default())
                                        on:input=move |ev| set_questions.update(|q| {
                                            if let Some(slot) = q.get_mut(qi).and_then(|x| x.options.get_mut(oi)) {
                                                *slot = event_target_value(&ev);
                                            }
                                        })
                                    />
                                </div>
                            }).collect_view()}
                        </div>
                    }
                />
                <button type="button" class="btn btn-outline" on:click=move |_| set_questions.update(|q| q.push(blank_question()))>
                    "Add Question"
                </button>
                <button class="btn btn-primary">"Save Quiz"</button>
            </form>
        </div>
    }
}
