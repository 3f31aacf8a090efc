//! Two stacked canvases driven by one engine [`Viewer`].
//!
//! The bottom canvas shows the blueprint and receives pointer input; the top
//! canvas carries the overlay, ignores pointer events and is moved to the
//! placement the viewer reports for each frame.

use leptos::ev::{MouseEvent, WheelEvent};
use leptos::prelude::*;
use leptos::task::spawn_local;
use overlay_engine::{
    Detection, ImageDimensions, LoadTicket, Point, Size, Surface, Viewer, ViewerConfig, ViewerError,
};
use tracing::{debug, warn};
use wasm_bindgen_futures::JsFuture;
use web_sys::{HtmlCanvasElement, HtmlImageElement};

use crate::canvas::{js_error, BrowserImage, CanvasSurface};

/// Fetch and decode `url`. The element is only referenced by the returned
/// image, so it is released as soon as the viewer lets go of it.
async fn load_image(url: String) -> Result<BrowserImage, ViewerError> {
    let image = HtmlImageElement::new().map_err(js_error)?;
    image.set_src(&url);
    JsFuture::from(image.decode())
        .await
        .map_err(|_| ViewerError::ImageLoad(format!("could not load {}", url)))?;
    Ok(BrowserImage(image))
}

#[derive(Debug, Clone, PartialEq)]
enum LoadStatus {
    Shown,
    Stale,
    Failed(String),
}

fn settle_load<H: ImageDimensions>(
    viewer: &mut Viewer<H>,
    ticket: LoadTicket,
    result: Result<H, ViewerError>,
) -> LoadStatus {
    match viewer.finish_load(ticket, result) {
        Ok(true) => LoadStatus::Shown,
        Ok(false) => LoadStatus::Stale,
        Err(e) => LoadStatus::Failed(e.to_string()),
    }
}

fn paint(
    viewer: &Viewer<BrowserImage>,
    base: HtmlCanvasElement,
    overlay: HtmlCanvasElement,
) -> Result<Option<u32>, ViewerError> {
    let mut base = CanvasSurface::new(base)?;
    base.resize(viewer.viewport())?;
    let mut overlay = CanvasSurface::new(overlay)?;

    let frame = viewer.render(&mut base, &mut overlay)?;
    if let Some(placement) = frame.placement {
        overlay.place(placement.origin())?;
    }
    if !frame.skipped.is_empty() {
        debug!("Skipped {} detections this frame", frame.skipped.len());
    }
    Ok(viewer.zoom_percent())
}

fn pointer(ev: &MouseEvent) -> Point {
    Point::new(ev.offset_x() as f64, ev.offset_y() as f64)
}

#[component]
pub fn BlueprintViewer(
    #[prop(into)] image_url: Signal<Option<String>>,
    #[prop(into)] detections: Signal<Vec<Detection>>,
    #[prop(into)] selected_label: Signal<Option<String>>,
    config: ViewerConfig,
) -> impl IntoView {
    let viewer = StoredValue::new_local(Viewer::<BrowserImage>::new(&config));
    let container_ref = NodeRef::<leptos::html::Div>::new();
    let base_ref = NodeRef::<leptos::html::Canvas>::new();
    let overlay_ref = NodeRef::<leptos::html::Canvas>::new();
    let zoom = RwSignal::new(Option::<u32>::None);
    let dragging = RwSignal::new(false);
    let load_error = RwSignal::new(Option::<String>::None);

    let redraw = move || {
        let (Some(base), Some(overlay)) = (base_ref.get_untracked(), overlay_ref.get_untracked()) else {
            return;
        };
        match viewer.with_value(|v| paint(v, base, overlay)) {
            Ok(percent) => zoom.set(percent),
            Err(e) => warn!("Render failed: {}", e),
        }
    };

    let fit_to_container = move || {
        let Some(container) = container_ref.get_untracked() else {
            return;
        };
        let size = Size::new(container.client_width() as f64, container.client_height() as f64);
        if size.is_empty() {
            return;
        }
        let resized = viewer.try_update_value(|v| v.resize(size));
        if let Some(Err(e)) = resized {
            warn!("Resize failed: {}", e);
        }
        redraw();
    };

    // Size the viewport once the container is mounted.
    Effect::new(move |_| {
        if container_ref.get().is_some() {
            fit_to_container();
        }
    });

    let resize_handle = window_event_listener(leptos::ev::resize, move |_| fit_to_container());
    on_cleanup(move || resize_handle.remove());

    Effect::new(move |_| {
        let Some(url) = image_url.get() else {
            return;
        };
        let Some(ticket) = viewer.try_update_value(|v| v.begin_load(url.clone())) else {
            return;
        };
        load_error.set(None);
        dragging.set(false);
        redraw();

        spawn_local(async move {
            let result = load_image(url).await;
            match viewer.try_update_value(|v| settle_load(v, ticket, result)) {
                Some(LoadStatus::Shown) => redraw(),
                Some(LoadStatus::Stale) | None => {}
                Some(LoadStatus::Failed(message)) => {
                    warn!("Blueprint image failed: {}", message);
                    load_error.set(Some(message));
                    redraw();
                }
            }
        });
    });

    Effect::new(move |_| {
        let list = detections.get();
        let label = selected_label.get();
        viewer.update_value(|v| {
            v.set_detections(list);
            v.set_selected_label(label);
        });
        redraw();
    });

    let on_mouse_down = move |ev: MouseEvent| {
        viewer.update_value(|v| v.pointer_down(pointer(&ev)));
        dragging.set(viewer.with_value(|v| v.is_dragging()));
    };

    let on_mouse_move = move |ev: MouseEvent| {
        if viewer.try_update_value(|v| v.pointer_move(pointer(&ev))).unwrap_or(false) {
            redraw();
        }
    };

    let on_mouse_up = move |_: MouseEvent| {
        viewer.update_value(|v| v.pointer_up());
        dragging.set(false);
    };

    let on_mouse_leave = move |_: MouseEvent| {
        viewer.update_value(|v| v.pointer_leave());
        dragging.set(false);
    };

    let on_wheel = move |ev: WheelEvent| {
        ev.prevent_default();
        if viewer.try_update_value(|v| v.wheel(ev.delta_y())).unwrap_or(false) {
            redraw();
        }
    };

    view! {
        <div
            class="blueprint-viewer"
            node_ref=container_ref
            style="position: relative; overflow: hidden; width: 100%; height: 600px;"
        >
            <canvas
                node_ref=base_ref
                width="800"
                height="600"
                style=move || {
                    format!(
                        "position: absolute; left: 0; top: 0; cursor: {};",
                        if dragging.get() { "grabbing" } else { "grab" },
                    )
                }
                on:mousedown=on_mouse_down
                on:mousemove=on_mouse_move
                on:mouseup=on_mouse_up
                on:mouseleave=on_mouse_leave
                on:wheel=on_wheel
            />
            <canvas
                node_ref=overlay_ref
                style="position: absolute; left: 0; top: 0; pointer-events: none;"
            />
            <div class="zoom-indicator">
                {move || zoom.get().map(|percent| format!("Zoom: {}%", percent))}
            </div>
            {move || load_error.get().map(|err| view! { <div class="error">{err}</div> })}
        </div>
    }
}
