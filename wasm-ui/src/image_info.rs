//! Image-info widget: detail view for one indexed image.
//!
//! The one request/response piece of the admin surface: the image id is the
//! trailing segment of the page location, fetched once from the versioned
//! API. Loading and failure are explicit view states rather than a
//! permanently empty shell.

use gloo::net::http::Request;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use imboard_panel::{ImageEnvelope, ImageRecord, image_endpoint, image_id_from_path};

/// Fetch lifecycle of the widget.
#[derive(Clone, PartialEq)]
enum FetchState {
    Loading,
    Failed(String),
    Loaded(ImageRecord),
}

#[derive(Properties, PartialEq)]
pub struct ImageInfoProps {
    /// Whether the widget is the whole page (adds the page heading) or
    /// embedded in another view.
    #[prop_or(true)]
    pub dedicated_page: bool,
}

impl Default for ImageInfoProps {
    fn default() -> Self {
        Self {
            dedicated_page: true,
        }
    }
}

#[function_component(ImageInfo)]
pub fn image_info(props: &ImageInfoProps) -> Html {
    let state = use_state(|| FetchState::Loading);

    {
        let state = state.clone();
        use_effect_with((), move |_| {
            spawn_local(async move {
                match fetch_current_image().await {
                    Ok(record) => state.set(FetchState::Loaded(record)),
                    Err(reason) => state.set(FetchState::Failed(reason)),
                }
            });
            || ()
        });
    }

    let body = match &*state {
        FetchState::Loading => html! {
            <div class="image-info-status">{ "Loading image…" }</div>
        },
        FetchState::Failed(reason) => html! {
            <div class="alert alert-danger" role="alert">
                { format!("Could not load image: {reason}") }
            </div>
        },
        FetchState::Loaded(image) => render_image(image),
    };

    html! {
        <div class="image-info">
            if props.dedicated_page {
                <h1>{ "Image details" }</h1>
            }
            { body }
        </div>
    }
}

fn render_image(image: &ImageRecord) -> Html {
    let dimensions = match (image.width, image.height) {
        (Some(w), Some(h)) => format!("{w} x {h}"),
        _ => "unknown".to_string(),
    };

    html! {
        <div class="card image-card">
            <img class="card-img-top" src={image.url.clone()} alt={format!("image {}", image.id)} />
            <div class="card-body">
                <ul class="list-group">
                    <li class="list-group-item">
                        <b>{ "Board" }</b>{ ": " }
                        { image.imboard_name.clone().unwrap_or_else(|| "unknown".to_string()) }
                    </li>
                    <li class="list-group-item">
                        <b>{ "Dimensions" }</b>{ ": " }{ dimensions }
                    </li>
                    if let Some(page_url) = &image.page_url {
                        <li class="list-group-item">
                            <a href={page_url.clone()}>{ "Source page" }</a>
                        </li>
                    }
                </ul>
                if !image.tags.is_empty() {
                    <div class="image-tags">
                        { for image.tags.iter().map(|tag| html! {
                            <span class="badge bg-secondary">{ tag }</span>
                        })}
                    </div>
                }
            </div>
        </div>
    }
}

/// Resolve the id from the page location and fetch its record.
async fn fetch_current_image() -> Result<ImageRecord, String> {
    let path = gloo::utils::window()
        .location()
        .pathname()
        .map_err(|_| "page location has no path".to_string())?;
    let id = image_id_from_path(&path)
        .ok_or_else(|| format!("no image id in location '{path}'"))?;

    let response = Request::get(&image_endpoint(id))
        .send()
        .await
        .map_err(|e| e.to_string())?;
    if !response.ok() {
        return Err(format!("HTTP {}", response.status()));
    }

    let envelope: ImageEnvelope = response.json().await.map_err(|e| e.to_string())?;
    Ok(envelope.result)
}
