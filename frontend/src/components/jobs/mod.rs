//! Background jobs panel.
//!
//! Keeps a coarse interval running for the whole page lifetime and refetches
//! the caller's job list on every tick. The `refresh` prop is a counter the
//! parent bumps when a tracked job finishes, forcing an immediate refetch
//! instead of waiting out the current cycle.

use gloo_timers::callback::Interval;
use yew::platform::spawn_local;
use yew::prelude::*;

use common::jobs::poll::LIST_REFRESH_MS;
use common::jobs::{Job, JobStatus};

use crate::api;
use crate::helpers::{show_toast, truncate_filename};

pub enum Msg {
    Tick,
    JobsLoaded(Vec<Job>),
    LoadFailed(String),
    Cancel(String),
    CancelDone(Result<(), String>),
}

#[derive(Properties, PartialEq)]
pub struct JobsPanelProps {
    /// Bumped by the parent to force an immediate refetch.
    pub refresh: u64,
}

pub struct JobsPanel {
    jobs: Vec<Job>,
    loaded: bool,
    _interval: Interval,
}

impl JobsPanel {
    fn refetch(ctx: &Context<Self>) {
        let link = ctx.link().clone();
        spawn_local(async move {
            match api::fetch_jobs().await {
                Ok(jobs) => link.send_message(Msg::JobsLoaded(jobs)),
                Err(e) => link.send_message(Msg::LoadFailed(e.message())),
            }
        });
    }
}

impl Component for JobsPanel {
    type Message = Msg;
    type Properties = JobsPanelProps;

    fn create(ctx: &Context<Self>) -> Self {
        let link = ctx.link().clone();
        let interval = Interval::new(LIST_REFRESH_MS, move || link.send_message(Msg::Tick));
        JobsPanel {
            jobs: Vec::new(),
            loaded: false,
            _interval: interval,
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::Tick => {
                Self::refetch(ctx);
                false
            }
            Msg::JobsLoaded(jobs) => {
                self.loaded = true;
                if self.jobs != jobs {
                    self.jobs = jobs;
                    return true;
                }
                false
            }
            Msg::LoadFailed(message) => {
                // Transient; the next tick retries.
                gloo_console::error!(format!("jobs refresh failed: {message}"));
                false
            }
            Msg::Cancel(job_id) => {
                let link = ctx.link().clone();
                spawn_local(async move {
                    let result = api::cancel_job(&job_id).await;
                    link.send_message(Msg::CancelDone(
                        result.map(|_| ()).map_err(|e| e.message()),
                    ));
                });
                false
            }
            Msg::CancelDone(result) => {
                match result {
                    Ok(()) => show_toast("Job cancelled."),
                    Err(message) => show_toast(&format!("Cancel request failed: {message}")),
                }
                Self::refetch(ctx);
                false
            }
        }
    }

    fn changed(&mut self, ctx: &Context<Self>, old_props: &Self::Properties) -> bool {
        if ctx.props().refresh != old_props.refresh {
            Self::refetch(ctx);
        }
        false
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        html! {
            <section class="jobs-panel">
                <h2>{ "Your jobs" }</h2>
                {
                    if self.jobs.is_empty() {
                        let hint = if self.loaded { "No jobs yet." } else { "Loading..." };
                        html! { <p class="jobs-empty">{ hint }</p> }
                    } else {
                        html! {
                            <ul class="jobs-list">
                                { for self.jobs.iter().map(|job| self.render_job(ctx, job)) }
                            </ul>
                        }
                    }
                }
            </section>
        }
    }

    fn rendered(&mut self, ctx: &Context<Self>, first_render: bool) {
        if first_render {
            Self::refetch(ctx);
        }
    }
}

impl JobsPanel {
    fn render_job(&self, ctx: &Context<Self>, job: &Job) -> Html {
        let status_class = format!("job-status {}", job.status);
        let actions = match job.status {
            JobStatus::Completed => {
                let href = job
                    .output_url
                    .clone()
                    .unwrap_or_else(|| format!("/download/{}", job.id));
                html! { <a class="job-download" href={href}>{ "Download" }</a> }
            }
            JobStatus::Queued | JobStatus::Processing => {
                let job_id = job.id.clone();
                let on_cancel = ctx
                    .link()
                    .callback(move |_: MouseEvent| Msg::Cancel(job_id.clone()));
                html! { <button class="job-cancel" onclick={on_cancel}>{ "Cancel" }</button> }
            }
            JobStatus::Error => match &job.error {
                Some(message) => html! { <span class="job-error">{ message.clone() }</span> },
                None => html! {},
            },
            JobStatus::Cancelled => html! {},
        };

        html! {
            <li class="job-row" key={job.id.clone()}>
                <span class="job-name" title={job.filename.clone()}>
                    { truncate_filename(&job.filename, 32) }
                </span>
                <span class={status_class}>{ job.status.to_string() }</span>
                {
                    if job.status == JobStatus::Processing {
                        html! { <span class="job-progress">{ job.progress }{ "%" }</span> }
                    } else {
                        html! {}
                    }
                }
                { actions }
            </li>
        }
    }
}
