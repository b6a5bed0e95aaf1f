use yew::platform::spawn_local;
use yew::prelude::*;

use crate::api;
use crate::components::editor::EditorComponent;
use crate::components::jobs::JobsPanel;
use crate::components::nav::NavBar;

pub enum Msg {
    AuthChecked(Option<String>),
    AuthChanged(Option<String>),
    /// A submitted job reached a terminal state, the jobs panel should
    /// refetch right away instead of waiting for its next cycle.
    JobFinished,
}

/// Root component: resolves the session once, then composes the page.
pub struct App {
    username: Option<String>,
    auth_resolved: bool,
    loaded: bool,
    jobs_refresh: u64,
}

impl Component for App {
    type Message = Msg;
    type Properties = ();

    fn create(_ctx: &Context<Self>) -> Self {
        App {
            username: None,
            auth_resolved: false,
            loaded: false,
            jobs_refresh: 0,
        }
    }

    fn update(&mut self, _ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::AuthChecked(username) => {
                self.username = username;
                self.auth_resolved = true;
                true
            }
            Msg::AuthChanged(username) => {
                self.username = username;
                true
            }
            Msg::JobFinished => {
                self.jobs_refresh += 1;
                true
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let on_auth_changed = ctx.link().callback(Msg::AuthChanged);
        let on_job_finished = ctx.link().callback(|_: ()| Msg::JobFinished);

        html! {
            <div class="page">
                <NavBar username={self.username.clone()} {on_auth_changed} />
                if self.auth_resolved {
                    if self.username.is_some() {
                        <main class="content">
                            <EditorComponent {on_job_finished} />
                            <JobsPanel refresh={self.jobs_refresh} />
                        </main>
                    } else {
                        <main class="content">
                            <p class="welcome">
                                { "Log in or create an account to start editing videos." }
                            </p>
                        </main>
                    }
                }
            </div>
        }
    }

    fn rendered(&mut self, ctx: &Context<Self>, first_render: bool) {
        if first_render && !self.loaded {
            self.loaded = true;
            let link = ctx.link().clone();
            spawn_local(async move {
                let username = match api::fetch_current_user().await {
                    Ok(user) if user.authenticated => user.username,
                    Ok(_) => None,
                    Err(e) => {
                        gloo_console::error!("session check failed:", e.message());
                        None
                    }
                };
                link.send_message(Msg::AuthChecked(username));
            });
        }
    }
}
