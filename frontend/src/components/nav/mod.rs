//! Top navigation bar: inline login/register form, logout and theme toggle.

use wasm_bindgen::JsCast;
use web_sys::{Event, HtmlInputElement};
use yew::platform::spawn_local;
use yew::prelude::*;

use crate::api;
use crate::helpers::show_toast;

const THEME_KEY: &str = "clipstream-theme";

#[derive(Clone, Copy, PartialEq)]
pub enum FormMode {
    Login,
    Register,
}

pub enum Msg {
    SetMode(FormMode),
    SetUsername(String),
    SetPassword(String),
    Submit,
    AuthSucceeded(String),
    AuthFailed(String),
    Logout,
    LoggedOut,
    ToggleTheme,
}

#[derive(Properties, PartialEq)]
pub struct NavBarProps {
    pub username: Option<String>,
    pub on_auth_changed: Callback<Option<String>>,
}

pub struct NavBar {
    mode: FormMode,
    username: String,
    password: String,
    pending: bool,
    dark: bool,
}

fn apply_theme(dark: bool) {
    if let Some(body) = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.body())
    {
        body.set_class_name(if dark { "dark" } else { "" });
    }
}

fn stored_theme() -> bool {
    web_sys::window()
        .and_then(|w| w.local_storage().ok().flatten())
        .and_then(|s| s.get_item(THEME_KEY).ok().flatten())
        .map(|v| v == "dark")
        .unwrap_or(false)
}

fn store_theme(dark: bool) {
    if let Some(storage) = web_sys::window().and_then(|w| w.local_storage().ok().flatten()) {
        let _ = storage.set_item(THEME_KEY, if dark { "dark" } else { "light" });
    }
}

impl Component for NavBar {
    type Message = Msg;
    type Properties = NavBarProps;

    fn create(_ctx: &Context<Self>) -> Self {
        let dark = stored_theme();
        apply_theme(dark);
        NavBar {
            mode: FormMode::Login,
            username: String::new(),
            password: String::new(),
            pending: false,
            dark,
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::SetMode(mode) => {
                self.mode = mode;
                true
            }
            Msg::SetUsername(value) => {
                self.username = value;
                false
            }
            Msg::SetPassword(value) => {
                self.password = value;
                false
            }
            Msg::Submit => {
                if self.pending || self.username.trim().is_empty() || self.password.is_empty() {
                    return false;
                }
                self.pending = true;
                let username = self.username.trim().to_string();
                let password = self.password.clone();
                let mode = self.mode;
                let link = ctx.link().clone();
                spawn_local(async move {
                    let result = match mode {
                        FormMode::Login => api::login(username.clone(), password).await,
                        FormMode::Register => api::register(username.clone(), password).await,
                    };
                    match result {
                        Ok(()) => link.send_message(Msg::AuthSucceeded(username)),
                        Err(e) => link.send_message(Msg::AuthFailed(e.message())),
                    }
                });
                true
            }
            Msg::AuthSucceeded(username) => {
                self.pending = false;
                self.password.clear();
                ctx.props().on_auth_changed.emit(Some(username));
                true
            }
            Msg::AuthFailed(message) => {
                self.pending = false;
                show_toast(&message);
                true
            }
            Msg::Logout => {
                let link = ctx.link().clone();
                spawn_local(async move {
                    if let Err(e) = api::logout().await {
                        gloo_console::error!("logout failed:", e.message());
                    }
                    link.send_message(Msg::LoggedOut);
                });
                false
            }
            Msg::LoggedOut => {
                ctx.props().on_auth_changed.emit(None);
                // Full reload clears any per-session view state.
                if let Some(window) = web_sys::window() {
                    let _ = window.location().reload();
                }
                false
            }
            Msg::ToggleTheme => {
                self.dark = !self.dark;
                apply_theme(self.dark);
                store_theme(self.dark);
                true
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let on_username = ctx.link().callback(|e: Event| {
            let value = e
                .target()
                .and_then(|t| t.dyn_into::<HtmlInputElement>().ok())
                .map(|i| i.value())
                .unwrap_or_default();
            Msg::SetUsername(value)
        });
        let on_password = ctx.link().callback(|e: Event| {
            let value = e
                .target()
                .and_then(|t| t.dyn_into::<HtmlInputElement>().ok())
                .map(|i| i.value())
                .unwrap_or_default();
            Msg::SetPassword(value)
        });
        let on_submit = ctx.link().callback(|_: MouseEvent| Msg::Submit);
        let on_logout = ctx.link().callback(|_: MouseEvent| Msg::Logout);
        let on_theme = ctx.link().callback(|_: MouseEvent| Msg::ToggleTheme);

        html! {
            <nav class="navbar">
                <span class="brand">{ "Clipstream" }</span>
                <div class="nav-actions">
                    <button class="theme-toggle" onclick={on_theme}>
                        { if self.dark { "Light" } else { "Dark" } }
                    </button>
                    {
                        match &ctx.props().username {
                            Some(username) => html! {
                                <>
                                    <span class="nav-user">{ username.clone() }</span>
                                    <button class="nav-logout" onclick={on_logout}>{ "Log out" }</button>
                                </>
                            },
                            None => html! {
                                <div class="auth-form">
                                    <input
                                        type="text"
                                        placeholder="Username"
                                        value={self.username.clone()}
                                        onchange={on_username}
                                    />
                                    <input
                                        type="password"
                                        placeholder="Password"
                                        value={self.password.clone()}
                                        onchange={on_password}
                                    />
                                    <button disabled={self.pending} onclick={on_submit}>
                                        {
                                            match self.mode {
                                                FormMode::Login => "Log in",
                                                FormMode::Register => "Register",
                                            }
                                        }
                                    </button>
                                    {
                                        match self.mode {
                                            FormMode::Login => html! {
                                                <button
                                                    class="mode-switch"
                                                    onclick={ctx.link().callback(|_: MouseEvent| Msg::SetMode(FormMode::Register))}
                                                >
                                                    { "Need an account?" }
                                                </button>
                                            },
                                            FormMode::Register => html! {
                                                <button
                                                    class="mode-switch"
                                                    onclick={ctx.link().callback(|_: MouseEvent| Msg::SetMode(FormMode::Login))}
                                                >
                                                    { "Have an account?" }
                                                </button>
                                            },
                                        }
                                    }
                                </div>
                            },
                        }
                    }
                </div>
            </nav>
        }
    }
}
