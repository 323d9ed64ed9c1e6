use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Param {
    Xg,
    Shots,
    Goals,
}

impl Param {
    pub const ALL: [Param; 3] = [Param::Xg, Param::Shots, Param::Goals];

    pub fn label(self) -> &'static str {
        match self {
            Param::Xg => "xG Total",
            Param::Shots => "Shots",
            Param::Goals => "Goals",
        }
    }

    pub fn slider_spec(self) -> SliderSpec {
        match self {
            Param::Xg => SliderSpec {
                min: 0.0,
                max: 20.0,
                step: 0.1,
                integer: false,
            },
            Param::Shots => SliderSpec {
                min: 1.0,
                max: 100.0,
                step: 1.0,
                integer: true,
            },
            Param::Goals => SliderSpec {
                min: 0.0,
                max: 50.0,
                step: 1.0,
                integer: true,
            },
        }
    }

    /// Field text for a slider position: one decimal for xG, whole numbers otherwise.
    pub fn format_value(self, value: f64) -> String {
        match self {
            Param::Xg => format!("{value:.1}"),
            Param::Shots | Param::Goals => format!("{}", value.trunc() as i64),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliderSpec {
    pub min: f64,
    pub max: f64,
    pub step: f64,
    /// Integer-backed sliders drop the fractional part of anything set on them.
    pub integer: bool,
}

impl SliderSpec {
    pub fn settle(&self, value: f64) -> f64 {
        let value = if self.integer { value.trunc() } else { value };
        value.clamp(self.min, self.max)
    }

    pub fn ratio(&self, value: f64) -> f64 {
        ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }

    fn snap(&self, value: f64) -> f64 {
        let steps = ((value - self.min) / self.step).round();
        self.min + steps * self.step
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nudge {
    Down,
    Up,
}

/// One slider/field pair. Sync is one-way per event: slider moves rewrite the
/// field, field commits move the slider.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamInput {
    param: Param,
    slider: f64,
    field: String,
}

impl ParamInput {
    pub fn new(param: Param, initial: f64) -> Self {
        let mut input = Self {
            param,
            slider: param.slider_spec().min,
            field: String::new(),
        };
        input.on_slider_change(initial);
        input
    }

    pub fn param(&self) -> Param {
        self.param
    }

    pub fn slider(&self) -> f64 {
        self.slider
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn on_slider_change(&mut self, new_value: f64) {
        self.slider = self.param.slider_spec().settle(new_value);
        self.field = self.param.format_value(self.slider);
    }

    /// Pushes the field text into the slider. Unparseable text leaves both
    /// sides as they are; callers drop the error without telling the user.
    pub fn on_field_commit(&mut self) -> Result<f64, AppError> {
        let raw = self.field.trim();
        let value = raw
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| AppError::Parse(raw.to_string()))?;
        self.slider = self.param.slider_spec().settle(value);
        Ok(self.slider)
    }

    pub fn nudge(&mut self, direction: Nudge) {
        let spec = self.param.slider_spec();
        let base = spec.snap(self.slider);
        let next = match direction {
            Nudge::Down => base - spec.step,
            Nudge::Up => base + spec.step,
        };
        // Snap again so repeated tenths don't accumulate drift.
        self.on_slider_change(spec.snap(next.clamp(spec.min, spec.max)));
    }

    pub fn push_char(&mut self, c: char) {
        self.field.push(c);
    }

    pub fn pop_char(&mut self) {
        self.field.pop();
    }

    pub fn set_field(&mut self, text: impl Into<String>) {
        self.field = text.into();
    }
}
