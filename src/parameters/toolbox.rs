use super::{Choice, ParamType, ParamValue, SharedSettings};
use crate::error::PanelError;

/// Range of spin boxes whose default does not give one.
const SPIN_BOX_MAXIMUM: i64 = 99;
const DOUBLE_SPIN_BOX_MAXIMUM: f64 = 99.99;
const DOUBLE_SPIN_BOX_DECIMALS: u32 = 2;

/// Editor shown for one parameter, with what it currently displays.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlKind {
    LineEdit {
        text: String,
    },
    ComboBox {
        items: Vec<String>,
        current: usize,
    },
    SpinBox {
        minimum: i64,
        maximum: i64,
        value: i64,
    },
    DoubleSpinBox {
        minimum: f64,
        maximum: f64,
        decimals: u32,
        value: f64,
    },
    CheckBox {
        checked: bool,
    },
}

impl ControlKind {
    pub fn name(&self) -> &'static str {
        match self {
            ControlKind::LineEdit { .. } => "line edit",
            ControlKind::ComboBox { .. } => "combo box",
            ControlKind::SpinBox { .. } => "spin box",
            ControlKind::DoubleSpinBox { .. } => "double spin box",
            ControlKind::CheckBox { .. } => "check box",
        }
    }

    /// Shows `value`, clamped and rounded the way the editor would.
    fn display(&mut self, value: &ParamValue) {
        match self {
            ControlKind::LineEdit { text } => *text = value.to_string(),
            ControlKind::ComboBox { items, current } => {
                let choice = Choice::decode(&value.to_string());
                if choice.items.len() > 1 || items.is_empty() {
                    *items = choice.items;
                }
                *current = choice.index.min(items.len().saturating_sub(1));
            }
            ControlKind::SpinBox {
                minimum,
                maximum,
                value: shown,
            } => *shown = value.to_i64().clamp(*minimum, *maximum),
            ControlKind::DoubleSpinBox {
                minimum,
                maximum,
                decimals,
                value: shown,
            } => *shown = round_to(value.to_f64(), *decimals).clamp(*minimum, *maximum),
            ControlKind::CheckBox { checked } => *checked = value.to_bool(),
        }
    }
}

/// One row of a page: a label and the editor bound to `key`.
#[derive(Debug, Clone, PartialEq)]
pub struct Control {
    pub key: String,
    /// text after the last `/` of the key
    pub label: String,
    pub param_type: ParamType,
    pub kind: ControlKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// prefix before the first `/` of the keys on this page
    pub name: String,
    controls: Vec<usize>,
}

/// Pages of editors generated from a settings registry, kept in sync with it
/// in both directions.
#[derive(Debug)]
pub struct ParameterPanel {
    settings: SharedSettings,
    pages: Vec<Page>,
    /// every rendered control, looked up by key for edits and resets
    controls: Vec<Control>,
    current_page: usize,
}

impl ParameterPanel {
    pub fn new(settings: SharedSettings) -> Self {
        let mut panel = Self {
            settings,
            pages: Vec::new(),
            controls: Vec::new(),
            current_page: 0,
        };
        panel.rebuild();
        panel
    }

    /// Regenerates every page from the registry's current content.
    pub fn rebuild(&mut self) {
        self.pages.clear();
        self.controls.clear();

        let settings = self.settings.borrow();
        for (key, value) in settings.parameters() {
            let Some(ty) = settings.parameter_type(key) else {
                log::debug!("parameter {} has no type, no control created", key);
                continue;
            };
            let default = settings.default_parameter(key);
            let group = key.split('/').next().unwrap_or(key);

            let page = match self.pages.iter().position(|p| p.name == group) {
                Some(page) => page,
                None => {
                    self.pages.push(Page {
                        name: group.to_owned(),
                        controls: Vec::new(),
                    });
                    self.pages.len() - 1
                }
            };
            self.pages[page].controls.push(self.controls.len());
            self.controls.push(Control {
                key: key.clone(),
                label: key.rsplit('/').next().unwrap_or(key).to_owned(),
                param_type: ty,
                kind: control_for(ty, value, default),
            });
        }
        drop(settings);

        if self.current_page >= self.pages.len() {
            self.current_page = 0;
        }
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn controls_on(&self, page: usize) -> impl Iterator<Item = &Control> {
        let controls = &self.controls;
        self.pages
            .get(page)
            .into_iter()
            .flat_map(move |p| p.controls.iter().map(move |&i| &controls[i]))
    }

    pub fn control(&self, key: &str) -> Option<&Control> {
        self.controls.iter().find(|c| c.key == key)
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn set_current_page(&mut self, page: usize) -> Result<(), PanelError> {
        if page >= self.pages.len() {
            return Err(PanelError::NoSuchPage(page));
        }
        self.current_page = page;
        Ok(())
    }

    pub fn edit_text(&mut self, key: &str, text: &str) -> Result<(), PanelError> {
        let control = self.control_mut(key)?;
        match &mut control.kind {
            ControlKind::LineEdit { text: shown } => *shown = text.to_owned(),
            other => return Err(wrong_kind(key, other)),
        }
        self.settings.borrow_mut().set_parameter(key, text);
        Ok(())
    }

    /// Picks item `index` of a combo box; the registry gets the whole list
    /// back as `index:item;item;...`.
    pub fn select_choice(&mut self, key: &str, index: usize) -> Result<(), PanelError> {
        let control = self.control_mut(key)?;
        let encoded = match &mut control.kind {
            ControlKind::ComboBox { items, current } => {
                if index >= items.len() {
                    return Err(PanelError::ChoiceOutOfRange {
                        key: key.to_owned(),
                        index,
                    });
                }
                *current = index;
                Choice {
                    index,
                    items: items.clone(),
                }
                .to_string()
            }
            other => return Err(wrong_kind(key, other)),
        };
        self.settings
            .borrow_mut()
            .set_parameter(key, encoded.as_str());
        Ok(())
    }

    /// Finishes editing a spin box. The value is clamped to its range.
    pub fn set_int(&mut self, key: &str, value: i64) -> Result<(), PanelError> {
        let control = self.control_mut(key)?;
        let ty = control.param_type;
        let shown = match &mut control.kind {
            ControlKind::SpinBox {
                minimum,
                maximum,
                value: shown,
            } => {
                *shown = value.clamp(*minimum, *maximum);
                *shown
            }
            other => return Err(wrong_kind(key, other)),
        };
        let stored = match ty {
            ParamType::Unsigned => {
                ParamValue::Unsigned(shown.clamp(0, u32::MAX as i64) as u32)
            }
            _ => ParamValue::Integer(shown.clamp(i32::MIN as i64, i32::MAX as i64) as i32),
        };
        self.settings.borrow_mut().set_parameter(key, stored);
        Ok(())
    }

    /// Finishes editing a double spin box. The value is rounded to the
    /// displayed decimals and clamped to its range.
    pub fn set_double(&mut self, key: &str, value: f64) -> Result<(), PanelError> {
        let control = self.control_mut(key)?;
        let shown = match &mut control.kind {
            ControlKind::DoubleSpinBox {
                minimum,
                maximum,
                decimals,
                value: shown,
            } => {
                *shown = round_to(value, *decimals).clamp(*minimum, *maximum);
                *shown
            }
            other => return Err(wrong_kind(key, other)),
        };
        self.settings.borrow_mut().set_parameter(key, shown);
        Ok(())
    }

    pub fn set_checked(&mut self, key: &str, checked: bool) -> Result<(), PanelError> {
        let control = self.control_mut(key)?;
        match &mut control.kind {
            ControlKind::CheckBox { checked: shown } => *shown = checked,
            other => return Err(wrong_kind(key, other)),
        }
        self.settings.borrow_mut().set_parameter(key, checked);
        Ok(())
    }

    /// Puts the default of every parameter on the current page back into its
    /// control and the registry. Parameters without a default are untouched.
    pub fn reset_current_page(&mut self) {
        let Some(page) = self.pages.get(self.current_page) else {
            return;
        };
        let mut settings = self.settings.borrow_mut();
        for &i in &page.controls {
            let control = &mut self.controls[i];
            let Some(default) = settings.default_parameter(&control.key).cloned() else {
                log::debug!("{} has no default, left as is", control.key);
                continue;
            };
            control.kind.display(&default);
            settings.set_parameter(&control.key, default);
        }
        log::debug!("reset page {}", page.name);
    }

    fn control_mut(&mut self, key: &str) -> Result<&mut Control, PanelError> {
        self.controls
            .iter_mut()
            .find(|c| c.key == key)
            .ok_or_else(|| PanelError::UnknownControl(key.to_owned()))
    }
}

fn wrong_kind(key: &str, kind: &ControlKind) -> PanelError {
    PanelError::WrongKind {
        key: key.to_owned(),
        kind: kind.name(),
    }
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round() / scale
}

/// Spin box range derived from the default: `[0, 10d]` for a positive
/// default, `[10d, 0]` for a negative one. `scaled` is the caller's `10d`.
fn bounds<T: PartialOrd + Copy>(default: T, scaled: T, zero: T, maximum: T) -> (T, T) {
    if default > zero {
        (zero, scaled)
    } else if default < zero {
        (scaled, zero)
    } else {
        (zero, maximum)
    }
}

/// More decimals for defaults of small magnitude.
fn decimals_for(default: f64) -> u32 {
    let magnitude = default.abs();
    if magnitude < 0.001 {
        4
    } else if magnitude < 0.1 {
        3
    } else {
        DOUBLE_SPIN_BOX_DECIMALS
    }
}

fn control_for(ty: ParamType, value: &ParamValue, default: Option<&ParamValue>) -> ControlKind {
    let mut kind = match ty {
        ParamType::Text | ParamType::Choice => {
            let reference = default.unwrap_or(value).to_string();
            if ty == ParamType::Choice || Choice::is_choice(&reference) {
                ControlKind::ComboBox {
                    items: Vec::new(),
                    current: 0,
                }
            } else {
                ControlKind::LineEdit {
                    text: String::new(),
                }
            }
        }
        ParamType::Integer | ParamType::Unsigned => {
            let default = default.map_or(0, ParamValue::to_i64);
            let (minimum, maximum) =
                bounds(default, default.saturating_mul(10), 0, SPIN_BOX_MAXIMUM);
            ControlKind::SpinBox {
                minimum,
                maximum,
                value: 0,
            }
        }
        ParamType::Double | ParamType::Float => {
            let default = default.map_or(0.0, ParamValue::to_f64);
            let (minimum, maximum) =
                bounds(default, default * 10.0, 0.0, DOUBLE_SPIN_BOX_MAXIMUM);
            ControlKind::DoubleSpinBox {
                minimum,
                maximum,
                decimals: decimals_for(default),
                value: 0.0,
            }
        }
        ParamType::Boolean => ControlKind::CheckBox { checked: false },
    };
    kind.display(value);
    kind
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::Settings;

    fn panel(settings: Settings) -> (SharedSettings, ParameterPanel) {
        let shared = settings.into_shared();
        let panel = ParameterPanel::new(shared.clone());
        (shared, panel)
    }

    #[test]
    fn one_page_per_group_in_registry_order() {
        let mut settings = Settings::new();
        settings.define("b/one", ParamType::Integer, 1);
        settings.define("a/two", ParamType::Boolean, true);
        settings.define("a/one", ParamType::Text, "hello");
        settings.define("solo", ParamType::Double, 2.0);
        let (_, panel) = panel(settings);

        let names: Vec<&str> = panel.pages().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "solo"]);
        let labels: Vec<&str> = panel.controls_on(0).map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["one", "two"]);
        assert_eq!(panel.controls_on(2).next().unwrap().label, "solo");
    }

    #[test]
    fn untyped_keys_get_no_control() {
        let mut settings = Settings::new();
        settings.define("a/typed", ParamType::Integer, 1);
        settings.set_parameter("a/untyped", 5);
        settings.set_parameter("z/untyped", 5);
        let (_, panel) = panel(settings);

        assert!(panel.control("a/untyped").is_none());
        assert_eq!(panel.pages().len(), 1);
        assert_eq!(panel.controls_on(0).count(), 1);
    }

    #[test]
    fn integer_bounds_scale_with_the_default() {
        let mut settings = Settings::new();
        settings.define("a/pos", ParamType::Integer, 31);
        settings.define("a/neg", ParamType::Integer, -3);
        settings.define("a/zero", ParamType::Unsigned, 0u32);
        let (_, panel) = panel(settings);

        let range = |key| match panel.control(key).unwrap().kind {
            ControlKind::SpinBox {
                minimum, maximum, ..
            } => (minimum, maximum),
            ref other => panic!("{:?}", other),
        };
        assert_eq!(range("a/pos"), (0, 310));
        assert_eq!(range("a/neg"), (-30, 0));
        assert_eq!(range("a/zero"), (0, 99));
    }

    #[test]
    fn huge_integer_default_is_saturated() {
        let mut settings = Settings::new();
        settings.define("a/x", ParamType::Integer, 1e19);
        settings.define("a/y", ParamType::Integer, -1e19);
        let (_, panel) = panel(settings);

        let max = i32::MAX as i64;
        assert_eq!(
            panel.control("a/x").unwrap().kind,
            ControlKind::SpinBox {
                minimum: 0,
                maximum: max * 10,
                value: max
            }
        );
        match panel.control("a/y").unwrap().kind {
            ControlKind::SpinBox { minimum, maximum, .. } => {
                assert_eq!((minimum, maximum), (i32::MIN as i64 * 10, 0))
            }
            ref other => panic!("{:?}", other),
        }
        assert_eq!(bounds(i64::MAX, i64::MAX.saturating_mul(10), 0, 99), (0, i64::MAX));
    }

    #[test]
    fn bounds_follow_the_default_not_the_value() {
        let mut settings = Settings::new();
        settings.define("a/x", ParamType::Integer, 5);
        settings.set_parameter("a/x", 500);
        let (_, panel) = panel(settings);

        assert_eq!(
            panel.control("a/x").unwrap().kind,
            ControlKind::SpinBox {
                minimum: 0,
                maximum: 50,
                value: 50
            }
        );
    }

    #[test]
    fn small_negative_double_default() {
        let mut settings = Settings::new();
        settings.define("a/d", ParamType::Double, -0.05);
        let (_, panel) = panel(settings);

        match panel.control("a/d").unwrap().kind {
            ControlKind::DoubleSpinBox {
                minimum,
                maximum,
                decimals,
                value,
            } => {
                assert!((minimum + 0.5).abs() < 1e-12);
                assert_eq!(maximum, 0.0);
                assert_eq!(decimals, 3);
                assert!((value + 0.05).abs() < 1e-12);
            }
            ref other => panic!("{:?}", other),
        }
    }

    #[test]
    fn decimals_grow_for_tiny_defaults() {
        assert_eq!(decimals_for(600.0), 2);
        assert_eq!(decimals_for(0.005), 3);
        assert_eq!(decimals_for(-0.0005), 4);
        assert_eq!(decimals_for(0.0), 4);
    }

    #[test]
    fn choice_detection_reads_the_default_first() {
        let mut settings = Settings::new();
        settings.define("a/name", ParamType::Text, "plain");
        settings.set_parameter("a/name", "1:x;y");
        settings.define("b/mode", ParamType::Text, "x");
        settings.clear_default("b/mode");
        settings.set_parameter("b/mode", "1:x;y");
        let (_, panel) = panel(settings);

        assert_eq!(
            panel.control("a/name").unwrap().kind,
            ControlKind::LineEdit {
                text: "1:x;y".into()
            }
        );
        assert_eq!(
            panel.control("b/mode").unwrap().kind,
            ControlKind::ComboBox {
                items: vec!["x".into(), "y".into()],
                current: 1
            }
        );
    }

    #[test]
    fn choice_selection_is_written_encoded() {
        let mut settings = Settings::new();
        settings.define("q/level", ParamType::Text, "0:Low;Medium;High");
        let (shared, mut panel) = panel(settings);

        assert_eq!(
            panel.control("q/level").unwrap().kind,
            ControlKind::ComboBox {
                items: vec!["Low".into(), "Medium".into(), "High".into()],
                current: 0
            }
        );
        panel.select_choice("q/level", 2).unwrap();
        assert_eq!(
            shared.borrow().parameter("q/level"),
            Some(&ParamValue::Text("2:Low;Medium;High".to_owned()))
        );
        assert_eq!(
            panel.select_choice("q/level", 3),
            Err(PanelError::ChoiceOutOfRange {
                key: "q/level".into(),
                index: 3
            })
        );
    }

    #[test]
    fn edits_write_through() {
        let (shared, mut panel) = panel(Settings::find_object_defaults());

        panel.edit_text("Camera/videoFilePath", "clip.avi").unwrap();
        panel.set_int("Fast/threshold", 1000).unwrap();
        panel.set_int("General/nextObjID", 4).unwrap();
        panel.set_double("Surf/hessianThreshold", 123.456).unwrap();
        panel.set_checked("Surf/upright", true).unwrap();

        let settings = shared.borrow();
        assert_eq!(
            settings.parameter("Camera/videoFilePath"),
            Some(&ParamValue::Text("clip.avi".into()))
        );
        // clamped to 10 x default
        assert_eq!(settings.parameter("Fast/threshold"), Some(&ParamValue::Integer(100)));
        assert_eq!(settings.parameter("General/nextObjID"), Some(&ParamValue::Unsigned(4)));
        assert_eq!(
            settings.parameter("Surf/hessianThreshold"),
            Some(&ParamValue::Double(123.46))
        );
        assert_eq!(settings.parameter("Surf/upright"), Some(&ParamValue::Boolean(true)));
    }

    #[test]
    fn edits_must_match_the_control() {
        let (_, mut panel) = panel(Settings::find_object_defaults());
        assert_eq!(
            panel.set_checked("Fast/threshold", true),
            Err(PanelError::WrongKind {
                key: "Fast/threshold".into(),
                kind: "spin box"
            })
        );
        assert_eq!(
            panel.set_int("Nope/key", 1),
            Err(PanelError::UnknownControl("Nope/key".into()))
        );
    }

    #[test]
    fn reset_restores_only_keys_with_defaults() {
        let mut settings = Settings::new();
        settings.define("a/x", ParamType::Integer, 5);
        settings.define("a/y", ParamType::Integer, 7);
        settings.clear_default("a/y");
        settings.define("b/z", ParamType::Integer, 1);
        let (shared, mut panel) = panel(settings);

        panel.set_int("a/x", 9).unwrap();
        shared.borrow_mut().set_parameter("a/y", 3);
        panel.set_int("b/z", 2).unwrap();

        panel.set_current_page(0).unwrap();
        panel.reset_current_page();

        let settings = shared.borrow();
        assert_eq!(settings.parameter("a/x"), Some(&ParamValue::Integer(5)));
        assert_eq!(settings.parameter("a/y"), Some(&ParamValue::Integer(3)));
        // other pages keep their edits
        assert_eq!(settings.parameter("b/z"), Some(&ParamValue::Integer(2)));
        match panel.control("a/x").unwrap().kind {
            ControlKind::SpinBox { value, .. } => assert_eq!(value, 5),
            ref other => panic!("{:?}", other),
        }
    }

    #[test]
    fn reset_restores_choice_and_text_controls() {
        let (shared, mut panel) = panel(Settings::find_object_defaults());
        let page = panel
            .pages()
            .iter()
            .position(|p| p.name == "Homography")
            .unwrap();
        panel.select_choice("Homography/method", 0).unwrap();
        panel.set_current_page(page).unwrap();
        panel.reset_current_page();

        assert_eq!(
            shared.borrow().parameter("Homography/method"),
            Some(&ParamValue::Text("1:LMEDS;RANSAC".into()))
        );
        match &panel.control("Homography/method").unwrap().kind {
            ControlKind::ComboBox { current, .. } => assert_eq!(*current, 1),
            other => panic!("{:?}", other),
        }
        assert_eq!(panel.set_current_page(99), Err(PanelError::NoSuchPage(99)));
    }
}
