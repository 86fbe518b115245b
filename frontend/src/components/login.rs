use coursehub::service::auth::{Credentials, SignupForm};
use coursehub_shared::Role;
use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::auth::use_auth;
use crate::components::common::{ErrorBanner, report};
use crate::web::router::{Link, use_router};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoginMode {
    User,
    Admin,
}

/// 登录成功后路由服务会把访客页重定向到首页
#[component]
fn CredentialsForm(mode: LoginMode) -> impl IntoView {
    let auth = use_auth();

    let (email, set_email) = signal(String::new());
    let (password, set_password) = signal(String::new());
    let (is_submitting, set_is_submitting) = signal(false);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        if email.get().is_empty() || password.get().is_empty() {
            set_error_msg.set(Some("Please fill in all fields".to_string()));
            return;
        }

        set_is_submitting.set(true);
        let credentials = Credentials {
            email: email.get(),
            password: password.get(),
        };
        spawn_local(async move {
            let app = auth.app();
            let result = match mode {
                LoginMode::User => app.login(credentials).await,
                LoginMode::Admin => app.admin_login(credentials).await,
            };
            report(result, set_error_msg);
            set_is_submitting.set(false);
        });
    };

    let (title, button) = match mode {
        LoginMode::User => ("Welcome back", "Log In"),
        LoginMode::Admin => ("Admin Login", "Log In as Admin"),
    };

    view! {
        <div class="hero min-h-screen">
            <div class="hero-content flex-col w-full max-w-md">
                <h1 class="text-3xl font-bold">{title}</h1>
                <div class="card shrink-0 w-full shadow-2xl bg-base-100">
                    <form class="card-body" on:submit=on_submit>
                        <ErrorBanner error=error_msg />
                        <div class="form-control">
                            <label class="label" for="email">
                                <span class="label-text">"Email"</span>
                            </label>
                            <input
                                id="email"
                                type="email"
                                on:input=move |ev| set_email.set(event_target_value(&ev))
                                prop:value=email
                                class="input input-bordered"
                                required
                            />
                        </div>
                        <div class="form-control">
                            <label class="label" for="password">
                                <span class="label-text">"Password"</span>
                            </label>
                            <input
                                id="password"
                                type="password"
                                on:input=move |ev| set_password.set(event_target_value(&ev))
                                prop:value=password
                                class="input input-bordered"
                                required
                            />
                        </div>
                        <div class="form-control mt-6">
                            <button class="btn btn-primary" disabled=move || is_submitting.get()>
                                {move || if is_submitting.get() {
                                    view! { <span class="loading loading-spinner"></span> "Signing in..." }.into_any()
                                } else {
                                    button.into_any()
                                }}
                            </button>
                        </div>
                        {(mode == LoginMode::User).then(|| view! {
                            <p class="text-sm text-center">
                                "No account yet? " <Link to="/signup" class="link link-primary">"Sign up"</Link>
                            </p>
                        })}
                    </form>
                </div>
            </div>
        </div>
    }
}

#[component]
pub fn LoginPage() -> impl IntoView {
    view! { <CredentialsForm mode=LoginMode::User /> }
}

#[component]
pub fn AdminLoginPage() -> impl IntoView {
    view! { <CredentialsForm mode=LoginMode::Admin /> }
}

#[component]
pub fn SignupPage() -> impl IntoView {
    let auth = use_auth();
    let router = use_router();

    let (name, set_name) = signal(String::new());
    let (email, set_email) = signal(String::new());
    let (password, set_password) = signal(String::new());
    let (role, set_role) = signal(Role::Student);
    let (is_submitting, set_is_submitting) = signal(false);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        set_is_submitting.set(true);
        let form = SignupForm {
            name: name.get(),
            email: email.get(),
            password: password.get(),
            role: role.get(),
        };
        spawn_local(async move {
            if report(auth.app().signup(form).await, set_error_msg).is_some() {
                router.navigate("/");
            }
            set_is_submitting.set(false);
        });
    };

    view! {
        <div class="hero min-h-screen">
            <div class="hero-content flex-col w-full max-w-md">
                <h1 class="text-3xl font-bold">"Create your account"</h1>
                <div class="card shrink-0 w-full shadow-2xl bg-base-100">
                    <form class="card-body" on:submit=on_submit>
                        <ErrorBanner error=error_msg />
                        <input
                            type="text"
                            placeholder="Full name"
                            on:input=move |ev| set_name.set(event_target_value(&ev))
                            prop:value=name
                            class="input input-bordered"
                        />
                        <input
                            type="email"
                            placeholder="Email"
                            on:input=move |ev| set_email.set(event_target_value(&ev))
                            prop:value=email
                            class="input input-bordered"
                        />
                        <input
                            type="password"
                            placeholder="Password"
                            on:input=move |ev| set_password.set(event_target_value(&ev))
                            prop:value=password
                            class="input input-bordered"
                        />
                        <select
                            class="select select-bordered"
                            on:change=move |ev| {
                                let role = match event_target_value(&ev).as_str() {
                                    "instructor" => Role::Instructor,
                                    _ => Role::Student,
                                };
                                set_role.set(role);
                            }
                        >
                            <option value="student" selected=move || role.get() == Role::Student>"I want to learn"</option>
                            <option value="instructor" selected=move || role.get() == Role::Instructor>"I want to teach"</option>
                        </select>
                        <button class="btn btn-primary mt-4" disabled=move || is_submitting.get()>
                            "Sign Up"
                        </button>
                        <p class="text-sm text-center">
                            "Already registered? " <Link to="/login" class="link link-primary">"Log in"</Link>
                        </p>
                    </form>
                </div>
            </div>
        </div>
    }
}
