//! Fixed table of ffmpeg presets, keyed by (media kind, action name).
//!
//! Each entry carries the filter arguments that go between `-i <input>` and
//! `-y <output>`. Two placeholders are substituted from the user's value:
//! `{value}` (the number as given) and `{recip}` (its reciprocal, for
//! `setpts`).

use std::{ffi::OsString, path::Path};

use crate::{Error, Result, kind::MediaKind};

/// How an action takes its single numeric parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Param {
    /// The action takes no value; anything given is ignored.
    None,
    /// A value must be supplied.
    Required { label: &'static str },
    /// A value may be supplied, else `default` is used.
    Optional { label: &'static str, default: f64 },
}

/// One catalog entry.
#[derive(Debug)]
pub struct ActionSpec {
    pub kind: MediaKind,
    pub name: &'static str,
    /// Older command spellings that resolve to this action.
    pub aliases: &'static [&'static str],
    pub summary: &'static str,
    pub param: Param,
    pub args: &'static [&'static str],
}

impl ActionSpec {
    fn matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
    }

    fn uses_reciprocal(&self) -> bool {
        self.args.iter().any(|a| a.contains("{recip}"))
    }

    /// `speed [multiplier]`, `hue <degrees>`, `reverse`.
    pub fn usage(&self) -> String {
        match self.param {
            Param::None => self.name.to_string(),
            Param::Required { label } => format!("{} <{label}>", self.name),
            Param::Optional { label, .. } => format!("{} [{label}]", self.name),
        }
    }
}

const VIDEO_SPEED: &[&str] = &["-filter:v", "setpts={recip}*PTS", "-filter:a", "atempo={value}"];
const AV_REVERSE: &[&str] = &["-vf", "reverse", "-af", "areverse"];
const NEGATE: &[&str] = &["-vf", "negate"];
const ROTATE_180: &[&str] = &["-vf", "transpose=2,transpose=2"];
const VFLIP: &[&str] = &["-vf", "vflip"];
const HFLIP: &[&str] = &["-vf", "hflip"];
const CONTRAST: &[&str] = &["-vf", "eq=contrast={value}"];
const GRAYSCALE: &[&str] = &["-vf", "hue=s=0"];
const HUE: &[&str] = &["-vf", "hue=h={value}"];
const BLUR: &[&str] = &["-vf", "gblur=sigma={value}"];
const MOSAIC: &[&str] = &[
    "-filter_complex",
    "[0:v]tile=2x2",
    "-c:v",
    "libx264",
    "-preset",
    "fast",
];
const AUDIO_SPEED: &[&str] = &["-filter:a", "atempo={value}"];
const AUDIO_REVERSE: &[&str] = &["-af", "areverse"];

const FLIPV: &[&str] = &["flipv"];
const FLIPH: &[&str] = &["fliph"];
const BLACK_AND_WHITE: &[&str] = &["blackandwhite"];

static CATALOG: &[ActionSpec] = &[
    // video
    ActionSpec {
        kind: MediaKind::Video,
        name: "speed",
        aliases: &[],
        summary: "Change playback speed (e.g. `2` for double speed).",
        param: Param::Optional {
            label: "multiplier",
            default: 1.0,
        },
        args: VIDEO_SPEED,
    },
    ActionSpec {
        kind: MediaKind::Video,
        name: "reverse",
        aliases: &[],
        summary: "Play the video and its audio backwards.",
        param: Param::None,
        args: AV_REVERSE,
    },
    ActionSpec {
        kind: MediaKind::Video,
        name: "invert",
        aliases: &[],
        summary: "Invert the colours.",
        param: Param::None,
        args: NEGATE,
    },
    ActionSpec {
        kind: MediaKind::Video,
        name: "rotate180",
        aliases: &[],
        summary: "Rotate by 180 degrees.",
        param: Param::None,
        args: ROTATE_180,
    },
    ActionSpec {
        kind: MediaKind::Video,
        name: "flip-vertical",
        aliases: FLIPV,
        summary: "Flip vertically.",
        param: Param::None,
        args: VFLIP,
    },
    ActionSpec {
        kind: MediaKind::Video,
        name: "flip-horizontal",
        aliases: FLIPH,
        summary: "Flip horizontally.",
        param: Param::None,
        args: HFLIP,
    },
    ActionSpec {
        kind: MediaKind::Video,
        name: "contrast",
        aliases: &[],
        summary: "Adjust contrast.",
        param: Param::Required { label: "amount" },
        args: CONTRAST,
    },
    ActionSpec {
        kind: MediaKind::Video,
        name: "grayscale",
        aliases: BLACK_AND_WHITE,
        summary: "Convert to black and white.",
        param: Param::None,
        args: GRAYSCALE,
    },
    ActionSpec {
        kind: MediaKind::Video,
        name: "hue",
        aliases: &[],
        summary: "Rotate the hue by the given degrees.",
        param: Param::Required { label: "degrees" },
        args: HUE,
    },
    ActionSpec {
        kind: MediaKind::Video,
        name: "blur",
        aliases: &[],
        summary: "Gaussian blur.",
        param: Param::Optional {
            label: "sigma",
            default: 1.0,
        },
        args: BLUR,
    },
    ActionSpec {
        kind: MediaKind::Video,
        name: "mosaic",
        aliases: &[],
        summary: "Tile the video in a 2x2 grid.",
        param: Param::None,
        args: MOSAIC,
    },
    // audio
    ActionSpec {
        kind: MediaKind::Audio,
        name: "speed",
        aliases: &[],
        summary: "Change playback speed.",
        param: Param::Optional {
            label: "multiplier",
            default: 1.0,
        },
        args: AUDIO_SPEED,
    },
    ActionSpec {
        kind: MediaKind::Audio,
        name: "reverse",
        aliases: &[],
        summary: "Play the audio backwards.",
        param: Param::None,
        args: AUDIO_REVERSE,
    },
    // image
    ActionSpec {
        kind: MediaKind::Image,
        name: "flip-vertical",
        aliases: FLIPV,
        summary: "Flip vertically.",
        param: Param::None,
        args: VFLIP,
    },
    ActionSpec {
        kind: MediaKind::Image,
        name: "flip-horizontal",
        aliases: FLIPH,
        summary: "Flip horizontally.",
        param: Param::None,
        args: HFLIP,
    },
    ActionSpec {
        kind: MediaKind::Image,
        name: "invert",
        aliases: &[],
        summary: "Invert the colours.",
        param: Param::None,
        args: NEGATE,
    },
    ActionSpec {
        kind: MediaKind::Image,
        name: "hue",
        aliases: &[],
        summary: "Rotate the hue by the given degrees.",
        param: Param::Required { label: "degrees" },
        args: HUE,
    },
    ActionSpec {
        kind: MediaKind::Image,
        name: "contrast",
        aliases: &[],
        summary: "Adjust contrast.",
        param: Param::Required { label: "amount" },
        args: CONTRAST,
    },
    ActionSpec {
        kind: MediaKind::Image,
        name: "grayscale",
        aliases: BLACK_AND_WHITE,
        summary: "Convert to black and white.",
        param: Param::None,
        args: GRAYSCALE,
    },
];

/// Every catalog entry, grouped by kind.
pub fn all() -> &'static [ActionSpec] {
    CATALOG
}

/// Entries for one kind, in display order.
pub fn actions_for(kind: MediaKind) -> impl Iterator<Item = &'static ActionSpec> {
    CATALOG.iter().filter(move |spec| spec.kind == kind)
}

/// Find an action by name or alias, case-insensitively.
pub fn lookup(kind: MediaKind, name: &str) -> Option<&'static ActionSpec> {
    actions_for(kind).find(|spec| spec.matches(name))
}

/// A catalog entry bound to a validated parameter.
#[derive(Debug, Clone, Copy)]
pub struct PreparedAction {
    pub spec: &'static ActionSpec,
    pub value: Option<f64>,
}

/// Resolve `name` for `kind` and validate `raw_value` against its rule.
pub fn prepare(kind: MediaKind, name: &str, raw_value: Option<&str>) -> Result<PreparedAction> {
    let spec = lookup(kind, name).ok_or_else(|| {
        let supported: Vec<&str> = actions_for(kind).map(|s| s.name).collect();
        Error::invalid_input(format!(
            "Unsupported action `{name}` for {kind}. Supported actions: {}.",
            supported.join(", ")
        ))
    })?;

    let raw_value = raw_value.map(str::trim).filter(|v| !v.is_empty());
    let value = match (spec.param, raw_value) {
        (Param::None, _) => None,
        (Param::Required { label }, None) => {
            return Err(Error::invalid_input(format!(
                "The `{}` action needs a value ({label}), e.g. `{kind} {} 1.5`.",
                spec.name, spec.name
            )));
        },
        (Param::Optional { default, .. }, None) => Some(default),
        (Param::Required { label } | Param::Optional { label, .. }, Some(raw)) => {
            Some(parse_number(spec, label, raw)?)
        },
    };

    if spec.uses_reciprocal() && value.is_some_and(|v| v <= 0.0) {
        return Err(Error::invalid_input(format!(
            "The `{}` {} must be greater than zero.",
            spec.name,
            match spec.param {
                Param::Optional { label, .. } | Param::Required { label } => label,
                Param::None => "value",
            }
        )));
    }

    Ok(PreparedAction { spec, value })
}

fn parse_number(spec: &ActionSpec, label: &str, raw: &str) -> Result<f64> {
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(Error::invalid_input(format!(
            "`{raw}` is not a number. The `{}` action expects a numeric {label}.",
            spec.name
        ))),
    }
}

impl PreparedAction {
    /// Filter arguments with placeholders filled in.
    pub fn filter_args(&self) -> Vec<String> {
        let value = self.value.map(|v| v.to_string()).unwrap_or_default();
        let recip = self.value.map(|v| (1.0 / v).to_string()).unwrap_or_default();
        self.spec
            .args
            .iter()
            .map(|arg| arg.replace("{value}", &value).replace("{recip}", &recip))
            .collect()
    }

    /// Full ffmpeg argument list for one run.
    pub fn tool_args(&self, input: &Path, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-hide_banner", "-loglevel", "error", "-i"]
            .into_iter()
            .map(OsString::from)
            .collect();
        args.push(input.as_os_str().to_owned());
        args.extend(self.filter_args().into_iter().map(OsString::from));
        args.push("-y".into());
        args.push(output.as_os_str().to_owned());
        args
    }
}
