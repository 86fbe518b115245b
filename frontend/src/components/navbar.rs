use coursehub::navigation::visible_actions;
use coursehub::service::notifications::NotificationFeed;
use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::auth::use_auth;
use crate::web::Interval;
use crate::web::router::{Link, use_router};

#[component]
pub fn Navbar() -> impl IntoView {
    let auth = use_auth();
    let router = use_router();
    let viewer = auth.viewer_signal();
    let section = router.section();

    let greeting = move || {
        auth.session
            .get()
            .map(|s| format!("Hi, {}", s.user.first_name()))
    };

    view! {
        <div class="navbar bg-base-100 shadow-sm">
            <div class="flex-1">
                <Link to="/" class="btn btn-ghost text-xl">"CourseHub"</Link>
                <ul class="menu menu-horizontal px-1 hidden md:flex">
                    {move || {
                        visible_actions(viewer.get())
                            .iter()
                            .map(|action| {
                                let action = *action;
                                let class = if section.get() == action.section() { "active" } else { "" };
                                view! {
                                    <li>
                                        <Link to=action.path() class=class>{action.label()}</Link>
                                    </li>
                                }
                            })
                            .collect_view()
                    }}
                </ul>
            </div>
            <div class="flex-none gap-2">
                {move || match greeting() {
                    Some(text) => view! {
                        <NotificationBell />
                        <span class="hidden sm:inline">{text}</span>
                        <button class="btn btn-ghost btn-sm" on:click=move |_| auth.logout()>
                            "Logout"
                        </button>
                    }
                    .into_any(),
                    None => view! {
                        <Link to="/login" class="btn btn-ghost btn-sm">"Login"</Link>
                        <Link to="/signup" class="btn btn-primary btn-sm">"Sign Up"</Link>
                    }
                    .into_any(),
                }}
            </div>
        </div>
    }
}

/// 通知铃铛，按配置的间隔轮询
#[component]
fn NotificationBell() -> impl IntoView {
    let auth = use_auth();
    let (feed, set_feed) = signal(NotificationFeed::default());
    let (open, set_open) = signal(false);

    spawn_local(async move {
        match auth.app().notifications().await {
            Ok(items) => set_feed.set(items),
            Err(e) => log::warn!("notifications unavailable: {}", e),
        }
    });

    let poll = auth.app().config.notification_poll;
    let interval = Interval::new(poll, move || {
        spawn_local(async move {
            match auth.app().poll_notifications().await {
                Ok(items) => set_feed.set(items),
                Err(e) => log::warn!("notification poll failed: {}", e),
            }
        });
    });
    // 组件卸载时 drop，定时器随之清除
    let interval = StoredValue::new_local(interval);
    on_cleanup(move || interval.dispose());

    let mark_read = move |id: String| {
        let mut current = feed.get_untracked();
        spawn_local(async move {
            let result = auth.app().mark_notification_read(&mut current, &id).await;
            if let Err(e) = result {
                log::warn!("{}", e);
            }
            set_feed.set(current);
        });
    };

    view! {
        <div class="dropdown dropdown-end">
            <button class="btn btn-ghost btn-circle" on:click=move |_| set_open.update(|o| *o = !*o)>
                <div class="indicator">
                    <span>"🔔"</span>
                    {move || {
                        let unread = feed.with(|f| f.unread_count());
                        (unread > 0).then(|| view! {
                            <span class="badge badge-xs badge-primary indicator-item">{format!("{}", unread)}</span>
                        })
                    }}
                </div>
            </button>
            <Show when=move || open.get()>
                <ul class="menu dropdown-content bg-base-100 rounded-box z-10 w-80 p-2 shadow">
                    {move || {
                        let items = feed.get().items;
                        if items.is_empty() {
                            return view! { <li class="p-2 text-sm">"No notifications"</li> }.into_any();
                        }
                        items
                            .into_iter()
                            .map(|n| {
                                let id = n.id.clone();
                                let class = if n.read { "opacity-60" } else { "font-semibold" };
                                view! {
                                    <li class=class>
                                        <a on:click=move |_| mark_read(id.clone())>
                                            <div>
                                                {n.title.clone().map(|t| view! { <p class="font-bold">{t}</p> })}
                                                <p class="text-sm">{n.message.clone()}</p>
                                            </div>
                                        </a>
                                    </li>
                                }
                            })
                            .collect_view()
                            .into_any()
                    }}
                </ul>
            </Show>
        </div>
    }
}
