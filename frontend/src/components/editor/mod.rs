//! Upload-and-edit form: root module wiring the Yew `Component`
//! implementation with submodules for state, update logic and rendering.
//!
//! The component owns the whole submission lifecycle: picking a file,
//! tweaking effect options, submitting the multipart form, polling the job
//! until it finishes and offering the result.

use yew::prelude::*;

mod messages;
mod props;
mod state;
mod update;
mod view;

pub use messages::Msg;
pub use props::EditorProps;
pub use state::EditorComponent;

impl Component for EditorComponent {
    type Message = Msg;
    type Properties = EditorProps;

    fn create(_ctx: &Context<Self>) -> Self {
        EditorComponent::new()
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        update::update(self, ctx, msg)
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        view::view(self, ctx)
    }
}
