//! 管理后台

use coursehub::service::admin::AdminOverview;
use coursehub_shared::{Course, Role};
use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::auth::use_auth;
use crate::components::common::{ErrorAlert, ErrorBanner, Load, Spinner, format_price, report, spawn_load};
use crate::web::router::Link;

#[component]
pub fn AdminPage() -> impl IntoView {
    let auth = use_auth();
    let (overview, set_overview) = signal(Load::<AdminOverview>::Loading);
    spawn_load(set_overview, async move {
        let app = auth.app();
        app.admin_overview().await
    });

    view! {
        <div class="max-w-6xl mx-auto p-4 md:p-8 space-y-6">
            <h1 class="text-3xl font-bold">"Admin Dashboard"</h1>
            {move || match overview.get() {
                Load::Loading => view! { <Spinner /> }.into_any(),
                Load::Failed(message) => view! { <ErrorAlert message=message /> }.into_any(),
                Load::Ready(o) => {
                    let students = o.users_with_role(Role::Student);
                    let instructors = o.users_with_role(Role::Instructor);
                    view! {
                        <div class="stats shadow w-full stats-vertical md:stats-horizontal bg-base-100">
                            <div class="stat">
                                <div class="stat-title">"Users"</div>
                                <div class="stat-value">{format!("{}", o.stats.users)}</div>
                                <div class="stat-desc">{format!("{} students, {} instructors", students, instructors)}</div>
                            </div>
                            <div class="stat">
                                <div class="stat-title">"Courses"</div>
                                <div class="stat-value">{format!("{}", o.stats.courses)}</div>
                            </div>
                            <div class="stat">
                                <div class="stat-title">"Enrollments"</div>
                                <div class="stat-value">{format!("{}", o.stats.enrollments)}</div>
                            </div>
                            <div class="stat">
                                <div class="stat-title">"Revenue"</div>
                                <div class="stat-value">{format!("${:.2}", o.stats.revenue)}</div>
                            </div>
                        </div>
                        <h2 class="text-2xl font-semibold">"Users"</h2>
                        <table class="table bg-base-100">
                            <thead><tr><th>"Name"</th><th>"Email"</th><th>"Role"</th></tr></thead>
                            <tbody>
                                {o.users.into_iter().map(|u| view! {
                                    <tr>
                                        <td>{u.name}</td>
                                        <td>{u.email}</td>
                                        <td>{u.role.map(|r| r.as_str()).unwrap_or("-")}</td>
                                    </tr>
                                }).collect_view()}
                            </tbody>
                        </table>
                        <Link to="/admin/courses" class="btn btn-primary">"Manage Courses"</Link>
                    }
                    .into_any()
                }
            }}
        </div>
    }
}

#[component]
pub fn AdminCoursesPage() -> impl IntoView {
    let auth = use_auth();
    let (courses, set_courses) = signal(Load::<Vec<Course>>::Loading);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);
    spawn_load(set_courses, async move {
        let app = auth.app();
        app.admin_courses().await
    });

    let delete = move |id: String| {
        let Load::Ready(current) = courses.get_untracked() else {
            return;
        };
        spawn_local(async move {
            let app = auth.app();
            if let Some(remaining) = report(app.admin_delete_course(&current, &id).await, set_error_msg) {
                set_courses.set(Load::Ready(remaining));
            }
        });
    };

    view! {
        <div class="max-w-6xl mx-auto p-4 md:p-8 space-y-6">
            <div class="flex justify-between items-center">
                <h1 class="text-3xl font-bold">"Manage Courses"</h1>
                <Link to="/admin/create-course" class="btn btn-primary">"Create Course"</Link>
            </div>
            <ErrorBanner error=error_msg />
            {move || match courses.get() {
                Load::Loading => view! { <Spinner /> }.into_any(),
                Load::Failed(message) => view! { <ErrorAlert message=message /> }.into_any(),
                Load::Ready(list) => view! {
                    <table class="table bg-base-100">
                        <thead><tr><th>"Title"</th><th>"Instructor"</th><th>"Price"</th><th></th></tr></thead>
                        <tbody>
                            {list.into_iter().map(|course| {
                                let id = course.id.clone();
                                view! {
                                    <tr>
                                        <td>
                                            <Link to=format!("/course/{}", course.id) class="link">{course.title.clone()}</Link>
                                        </td>
                                        <td>{course.instructor.map(|i| i.name).unwrap_or_default()}</td>
                                        <td>{format_price(course.price)}</td>
                                        <td>
                                            <button class="btn btn-xs btn-error" on:click=move |_| delete(id.clone())>
                                                "Delete"
                                            </button>
                                        </td>
                                    </tr>
                                }
                            }).collect_view()}
                        </tbody>
                    </table>
                }
                .into_any(),
            }}
        </div>
    }
}
