use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct EditorProps {
    /// Fired whenever a tracked job reaches a terminal state so the jobs
    /// panel can refetch immediately.
    pub on_job_finished: Callback<()>,
}
