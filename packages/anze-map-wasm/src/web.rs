// Browser wiring: the JS map glue, DOM checkboxes, sensors and the filter
// panel. Everything here is a thin adapter over the target-independent core.

use std::cell::RefCell;
use std::rc::Rc;

use geo_types::{Point, Rect};
use js_sys::{Function, Object, Reflect};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, Event, HtmlElement, HtmlInputElement, PositionOptions, Window};

use crate::category::CategoryKind;
use crate::config::WidgetConfig;
use crate::controller::LayerController;
use crate::error::MapError;
use crate::fetcher::HttpFetcher;
use crate::mapper::{bounds_to_json, VisualLayer};
use crate::panel::PanelState;
use crate::popup::escape_html;
use crate::registry::{LayerId, ToggleKey};
use crate::surface::MapSurface;
use crate::toggle::{ToggleMachine, ToggleState};
use crate::tracker::PositionTracker;
use crate::{console_log, console_warn};

const NO_GEOLOCATION: &str = "⚠️ Il tuo dispositivo non supporta la geolocalizzazione GPS.";

#[wasm_bindgen]
extern "C" {
    /// Map glue object provided by the host page (Leaflet or similar).
    pub type JsMapSurface;

    #[wasm_bindgen(method, js_name = addTileLayer)]
    fn add_tile_layer(this: &JsMapSurface, url: &str, max_zoom: u8, attribution: &str);

    #[wasm_bindgen(method, js_name = setView)]
    fn set_view(this: &JsMapSurface, lat: f64, lng: f64, zoom: u8);

    #[wasm_bindgen(method, js_name = addLayer)]
    fn add_layer(this: &JsMapSurface, layer: JsValue) -> u32;

    #[wasm_bindgen(method, js_name = removeLayer)]
    fn remove_layer(this: &JsMapSurface, id: u32);

    #[wasm_bindgen(method, js_name = fitBounds)]
    fn fit_bounds(this: &JsMapSurface, bounds: JsValue);

    #[wasm_bindgen(method, js_name = addHomeMarker)]
    fn add_home_marker(this: &JsMapSurface, lat: f64, lng: f64, popup: &str);

    #[wasm_bindgen(method, js_name = addUserMarker)]
    fn add_user_marker(this: &JsMapSurface, lat: f64, lng: f64, heading: f64) -> u32;

    #[wasm_bindgen(method, js_name = moveMarker)]
    fn move_marker(this: &JsMapSurface, id: u32, lat: f64, lng: f64);

    #[wasm_bindgen(method, js_name = rotateMarker)]
    fn rotate_marker(this: &JsMapSurface, id: u32, heading: f64);

    #[wasm_bindgen(method, js_name = onClick)]
    fn on_click(this: &JsMapSurface, callback: &Function);
}

fn to_js<T: Serialize>(value: &T) -> JsValue {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .unwrap_or_else(|e| {
            console_warn!("Could not serialize value for JS: {}", e);
            JsValue::NULL
        })
}

pub struct JsSurface(JsMapSurface);

impl MapSurface for JsSurface {
    fn add_layer(&self, layer: &VisualLayer) -> LayerId {
        LayerId(self.0.add_layer(to_js(&layer.to_json())))
    }

    fn remove_layer(&self, id: LayerId) {
        self.0.remove_layer(id.0);
    }

    fn fit_bounds(&self, bounds: Rect<f64>) {
        self.0.fit_bounds(to_js(&bounds_to_json(bounds)));
    }

    fn set_view(&self, position: Point<f64>, zoom: u8) {
        self.0.set_view(position.y(), position.x(), zoom);
    }

    fn add_user_marker(&self, position: Point<f64>, heading: f64) -> LayerId {
        LayerId(self.0.add_user_marker(position.y(), position.x(), heading))
    }

    fn move_marker(&self, id: LayerId, position: Point<f64>) {
        self.0.move_marker(id.0, position.y(), position.x());
    }

    fn rotate_marker(&self, id: LayerId, heading: f64) {
        self.0.rotate_marker(id.0, heading);
    }
}

type WebController = LayerController<JsSurface, HttpFetcher>;

fn window() -> Result<Window, MapError> {
    web_sys::window().ok_or_else(|| MapError::Js("no window".to_string()))
}

fn document() -> Result<Document, MapError> {
    window()?
        .document()
        .ok_or_else(|| MapError::Js("no document".to_string()))
}

fn set_display(element: &Element, visible: bool) -> Result<(), MapError> {
    if let Some(el) = element.dyn_ref::<HtmlElement>() {
        el.style()
            .set_property("display", if visible { "block" } else { "none" })?;
    }
    Ok(())
}

fn on_change<F>(input: &HtmlInputElement, mut handler: F) -> Result<(), MapError>
where
    F: FnMut(bool) + 'static,
{
    let target = input.clone();
    let closure = Closure::<dyn FnMut(Event)>::new(move |_: Event| handler(target.checked()));
    input.add_event_listener_with_callback("change", closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

/// The whole widget as seen from JavaScript.
#[wasm_bindgen]
pub struct AnzeMap {
    config: Rc<WidgetConfig>,
    controller: WebController,
    tracker: Rc<RefCell<PositionTracker<JsSurface>>>,
    panel: Rc<RefCell<PanelState>>,
    surface: Rc<JsSurface>,
}

#[wasm_bindgen]
impl AnzeMap {
    /// Boot the base map (tiles, initial view, business marker).
    #[wasm_bindgen(constructor)]
    pub fn new(surface: JsMapSurface, config: JsValue) -> Result<AnzeMap, JsValue> {
        let config = Rc::new(WidgetConfig::from_js(config)?);
        let surface = Rc::new(JsSurface(surface));

        surface
            .0
            .add_tile_layer(&config.tile_url, config.max_zoom, &config.attribution);
        surface.set_view(Point::new(config.center[1], config.center[0]), config.zoom);
        surface
            .0
            .add_home_marker(config.home.lat, config.home.lng, &config.home.popup);

        let machine = ToggleMachine::new(config.categories.clone(), surface.clone());
        let controller = LayerController::new(machine, HttpFetcher::new(&config.data_dir));
        let tracker = PositionTracker::new(surface.clone(), config.locate_zoom);

        console_log!("Map widget initialized");
        Ok(AnzeMap {
            config,
            controller,
            tracker: Rc::new(RefCell::new(tracker)),
            panel: Rc::new(RefCell::new(PanelState::default())),
            surface,
        })
    }

    /// Attach listeners to the filter panel, master checkboxes and
    /// `[data-file]` point-of-interest checkboxes.
    #[wasm_bindgen(js_name = bindDom)]
    pub fn bind_dom(&self) -> Result<(), JsValue> {
        self.bind_routes()?;
        self.bind_pois()?;
        self.bind_panel()?;
        Ok(())
    }

    #[wasm_bindgen(js_name = toggleMaster)]
    pub fn toggle_master(&self, category: String, checked: bool) {
        spawn_master(self.controller.clone(), category, checked);
    }

    #[wasm_bindgen(js_name = toggleSub)]
    pub fn toggle_sub(&self, category: String, name: String, checked: bool) {
        spawn_sub(self.controller.clone(), category, name, checked);
    }

    #[wasm_bindgen(js_name = togglePanel)]
    pub fn toggle_panel(&self, state: Option<bool>) -> Result<bool, JsValue> {
        let open = self.panel.borrow_mut().toggle(state);
        apply_panel(&self.config, &self.panel.borrow())?;
        Ok(open)
    }

    /// Forget cached data for a category; the next activation refetches it.
    pub fn reload(&self, category: &str) -> Result<bool, JsValue> {
        Ok(self.controller.machine().borrow_mut().reload(category)?)
    }

    #[wasm_bindgen(js_name = cacheStats)]
    pub fn cache_stats(&self) -> JsValue {
        to_js(&self.controller.machine().borrow().cache_stats())
    }

    /// Start following the device position and compass heading.
    #[wasm_bindgen(js_name = startTracking)]
    pub fn start_tracking(&self) -> Result<(), JsValue> {
        let window = window()?;
        let navigator = window.navigator();

        if Reflect::has(&navigator, &JsValue::from_str("geolocation"))? {
            let tracker = self.tracker.clone();
            let on_fix = Closure::<dyn FnMut(JsValue)>::new(move |pos: JsValue| {
                let coords = Reflect::get(&pos, &JsValue::from_str("coords")).unwrap_or(JsValue::NULL);
                let read = |k: &str| Reflect::get(&coords, &JsValue::from_str(k)).ok()?.as_f64();
                if let (Some(lat), Some(lng)) = (read("latitude"), read("longitude")) {
                    tracker.borrow_mut().on_position(lat, lng);
                }
            });
            let tracker = self.tracker.clone();
            let on_error = Closure::<dyn FnMut(JsValue)>::new(move |err: JsValue| {
                let message = Reflect::get(&err, &JsValue::from_str("message"))
                    .ok()
                    .and_then(|m| m.as_string())
                    .unwrap_or_default();
                tracker.borrow().on_error(&message);
            });

            let options = Object::new();
            Reflect::set(&options, &JsValue::from_str("enableHighAccuracy"), &JsValue::TRUE)?;
            navigator.geolocation()?.watch_position_with_error_callback_and_options(
                on_fix.as_ref().unchecked_ref(),
                Some(on_error.as_ref().unchecked_ref()),
                options.unchecked_ref::<PositionOptions>(),
            )?;
            on_fix.forget();
            on_error.forget();
        } else {
            window.alert_with_message(NO_GEOLOCATION)?;
        }

        if Reflect::has(&window, &JsValue::from_str("DeviceOrientationEvent"))? {
            // Absolute heading preferred, relative as fallback; both feed the same tracker
            for event in ["deviceorientationabsolute", "deviceorientation"] {
                let tracker = self.tracker.clone();
                let on_turn = Closure::<dyn FnMut(JsValue)>::new(move |e: JsValue| {
                    let alpha = Reflect::get(&e, &JsValue::from_str("alpha"))
                        .ok()
                        .and_then(|a| a.as_f64());
                    tracker.borrow_mut().on_orientation(alpha);
                });
                window.add_event_listener_with_callback_and_bool(
                    event,
                    on_turn.as_ref().unchecked_ref(),
                    true,
                )?;
                on_turn.forget();
            }
        }
        Ok(())
    }
}

impl AnzeMap {
    fn bind_routes(&self) -> Result<(), MapError> {
        let doc = document()?;
        for category in self.config.categories.routes() {
            let CategoryKind::Route {
                master_input,
                sub_container,
                ..
            } = &category.kind
            else {
                continue;
            };
            if let Some(container) = doc.get_element_by_id(sub_container) {
                set_display(&container, false)?;
            }
            let Some(input) = doc
                .get_element_by_id(master_input)
                .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
            else {
                console_warn!("Master checkbox #{} not found", master_input);
                continue;
            };
            let controller = self.controller.clone();
            let key = category.key.clone();
            on_change(&input, move |checked| {
                spawn_master(controller.clone(), key.clone(), checked)
            })?;
        }
        Ok(())
    }

    fn bind_pois(&self) -> Result<(), MapError> {
        let inputs = document()?.query_selector_all("[data-file]")?;
        for i in 0..inputs.length() {
            let Some(input) = inputs
                .get(i)
                .and_then(|n| n.dyn_into::<HtmlInputElement>().ok())
            else {
                continue;
            };
            let resource = input.get_attribute("data-file").unwrap_or_default();
            let Some(category) = self.config.categories.by_resource(&resource) else {
                console_warn!("No category for data file {}", resource);
                continue;
            };
            let controller = self.controller.clone();
            let key = category.key.clone();
            on_change(&input, move |checked| {
                spawn_master(controller.clone(), key.clone(), checked)
            })?;
        }
        Ok(())
    }

    fn bind_panel(&self) -> Result<(), MapError> {
        let window = window()?;
        let precision_pointer = window
            .match_media("(pointer:fine)")?
            .map(|m| m.matches())
            .unwrap_or(false);
        *self.panel.borrow_mut() = PanelState::new(precision_pointer);
        apply_panel(&self.config, &self.panel.borrow())?;

        if let Some(button) = document()?.get_element_by_id(&self.config.filter_button) {
            let (panel, config) = (self.panel.clone(), self.config.clone());
            let on_button = Closure::<dyn FnMut(Event)>::new(move |_: Event| {
                panel.borrow_mut().toggle(None);
                if let Err(e) = apply_panel(&config, &panel.borrow()) {
                    console_warn!("Panel update failed: {}", e);
                }
            });
            button.add_event_listener_with_callback("click", on_button.as_ref().unchecked_ref())?;
            on_button.forget();
        }

        let (panel, config) = (self.panel.clone(), self.config.clone());
        let on_map = Closure::<dyn FnMut()>::new(move || {
            let changed = panel.borrow_mut().on_map_click();
            if changed.is_some() {
                if let Err(e) = apply_panel(&config, &panel.borrow()) {
                    console_warn!("Panel update failed: {}", e);
                }
            }
        });
        self.surface.0.on_click(on_map.as_ref().unchecked_ref());
        on_map.forget();
        Ok(())
    }
}

fn apply_panel(config: &WidgetConfig, state: &PanelState) -> Result<(), MapError> {
    let doc = document()?;
    if let Some(panel) = doc.get_element_by_id(&config.filter_panel) {
        panel.class_list().toggle_with_force("open", state.is_open())?;
        panel.set_attribute("aria-hidden", state.aria_hidden())?;
    }
    if let Some(button) = doc.get_element_by_id(&config.filter_button) {
        button.set_attribute("aria-expanded", state.aria_expanded())?;
    }
    Ok(())
}

fn sub_container(controller: &WebController, category: &str) -> Result<Option<Element>, MapError> {
    let machine = controller.machine().borrow();
    let id = match machine.catalog().get(category).map(|c| &c.kind) {
        Some(CategoryKind::Route { sub_container, .. }) => sub_container.clone(),
        _ => return Ok(None),
    };
    Ok(document()?.get_element_by_id(&id))
}

// Rebuild the sub-toggle checkboxes from the machine's list, all unchecked.
fn render_sub_list(controller: &WebController, category: &str) -> Result<(), MapError> {
    let Some(container) = sub_container(controller, category)? else {
        return Ok(());
    };
    container.set_inner_html("");
    let master = ToggleKey::master(category);
    let entries = {
        let machine = controller.machine().borrow();
        if machine.state(&master) != ToggleState::Shown {
            return Ok(());
        }
        machine.sub_toggles(category).to_vec()
    };

    let doc = document()?;
    for entry in entries {
        let div = doc.create_element("div")?;
        div.set_class_name("option");
        let name = escape_html(&entry.name);
        div.set_inner_html(&format!(
            "<input type=\"checkbox\" data-type=\"{cat}\" data-name=\"{name}\" id=\"{id}\">\
             <label for=\"{id}\">{name}</label>",
            cat = escape_html(category),
            name = name,
            id = entry.dom_id,
        ));
        if let Some(input) = div
            .query_selector("input")?
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
        {
            let controller = controller.clone();
            let (category, name) = (category.to_string(), entry.name.clone());
            on_change(&input, move |checked| {
                spawn_sub(controller.clone(), category.clone(), name.clone(), checked)
            })?;
        }
        container.append_child(&div)?;
    }
    Ok(())
}

fn spawn_master(controller: WebController, category: String, checked: bool) {
    // Container visibility follows the checkbox right away; its content
    // follows the data once it arrives.
    match sub_container(&controller, &category) {
        Ok(Some(container)) => {
            if let Err(e) = set_display(&container, checked) {
                console_warn!("{}", e);
            }
        }
        Ok(None) => {}
        Err(e) => console_warn!("{}", e),
    }

    spawn_local(async move {
        match controller.set_master(&category, checked).await {
            // A superseded response must not rebuild the list under a newer one
            Ok(false) => {}
            Ok(true) => {
                if let Err(e) = render_sub_list(&controller, &category) {
                    console_warn!("Could not render routes for {}: {}", category, e);
                }
            }
            Err(e) => console_warn!("Toggle {} failed: {}", category, e),
        }
    });
}

fn spawn_sub(controller: WebController, category: String, name: String, checked: bool) {
    spawn_local(async move {
        if let Err(e) = controller.set_sub(&category, &name, checked).await {
            console_warn!("Toggle {}_{} failed: {}", category, name, e);
        }
    });
}
