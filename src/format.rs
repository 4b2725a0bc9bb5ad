//! Dataset rendering: structured text summary, HTML fragment, human sizes
//!
//! The renderer is an explicit component configured through
//! [`FormatOptions`] (expansion switches, row limit, pluggable variable
//! summarizer) instead of mutating any shared formatter state. Cosmetic
//! substitutions on the rendered text live in [`apply_substitutions`].

use crate::dataset::{Coordinate, CoordValues, DataVariable, Dataset};

/// Summarizer callback for one data variable line (plus attribute lines).
pub type VariableSummarizer = fn(&DataVariable, usize, &FormatOptions) -> String;

/// Rendering configuration for the plain-text summary.
#[derive(Debug, Clone)]
pub struct FormatOptions {
    pub expand_data_vars: bool,
    pub expand_attrs: bool,
    pub expand_data: bool,
    pub max_rows: usize,
    pub variable_summarizer: Option<VariableSummarizer>,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            expand_data_vars: true,
            expand_attrs: true,
            expand_data: true,
            max_rows: 100,
            variable_summarizer: None,
        }
    }
}

/// Human-readable size with 1024 steps and short SI-style labels.
pub fn human_size(bytes: u64) -> String {
    const STEPS: [(u64, &str); 5] = [
        (1 << 50, "PB"),
        (1 << 40, "TB"),
        (1 << 30, "GB"),
        (1 << 20, "MB"),
        (1 << 10, "KB"),
    ];
    for (factor, label) in STEPS {
        if bytes >= factor {
            return format!("{} {}", bytes / factor, label);
        }
    }
    if bytes == 1 {
        "1 byte".to_string()
    } else {
        format!("{} bytes", bytes)
    }
}

/// Plain-text structured summary of a dataset.
pub fn dataset_repr(dset: &Dataset, title: &str, opts: &FormatOptions) -> String {
    let col_width = column_width(dset);
    let mut out = vec![title.to_string()];

    let dims: Vec<String> = dset
        .dim_sizes()
        .iter()
        .map(|(name, size)| format!("{}: {}", name, size))
        .collect();
    out.push(format!("Dimensions:  ({})", dims.join(", ")));

    out.push("Coordinates:".to_string());
    if dset.coords().is_empty() {
        out.push("    *not enough information for display*".to_string());
    } else {
        for line in limited(dset.coords(), opts.max_rows, |coord| {
            summarize_coord(coord, col_width, opts)
        }) {
            out.push(line);
        }
    }

    out.push("Data variables:".to_string());
    if dset.data_vars().is_empty() {
        out.push("    *not enough information for display*".to_string());
    } else if !opts.expand_data_vars {
        out.push(format!("    ({} variables)", dset.data_vars().len()));
    } else {
        let summarizer = opts.variable_summarizer.unwrap_or(summarize_data_var);
        for line in limited(dset.data_vars(), opts.max_rows, |var| {
            summarizer(var, col_width, opts)
        }) {
            out.push(line);
        }
    }

    if !dset.attrs.is_empty() {
        out.push("Attributes:".to_string());
        let attrs: Vec<(&String, &String)> = dset.attrs.iter().collect();
        for line in limited(&attrs, opts.max_rows, |(key, value)| {
            format!("    {}: {}", key, value)
        }) {
            out.push(line);
        }
    }

    out.join("\n")
}

/// Default summarizer: variable line plus its attributes indented beneath.
pub fn summarize_data_var(var: &DataVariable, col_width: usize, opts: &FormatOptions) -> String {
    let data = if opts.expand_data {
        match var.backing {
            crate::dataset::Backing::Virtual => "...".to_string(),
            crate::dataset::Backing::File { nbytes } => format!("... ({})", human_size(nbytes)),
        }
    } else {
        "...".to_string()
    };
    let mut out = vec![format!(
        "    {:<width$} ({}) {} {}",
        var.name,
        var.dims.join(", "),
        var.dtype,
        data,
        width = col_width
    )];
    if opts.expand_attrs && !var.attrs.is_empty() {
        for (key, value) in &var.attrs {
            out.push(format!("        {}: {}", key, value));
        }
    }
    out.join("\n")
}

fn summarize_coord(coord: &Coordinate, col_width: usize, opts: &FormatOptions) -> String {
    let mut out = vec![format!(
        "  * {:<width$} ({}) {} {}",
        coord.name,
        coord.name,
        coord.dtype,
        axis_preview(&coord.values),
        width = col_width
    )];
    if opts.expand_attrs && !coord.attrs.is_empty() {
        for (key, value) in &coord.attrs {
            out.push(format!("        {}: {}", key, value));
        }
    }
    out.join("\n")
}

/// First and last axis values, elided in between.
fn axis_preview(values: &CoordValues) -> String {
    match values {
        CoordValues::Numeric(v) => match v.as_slice() {
            [] => "*empty*".to_string(),
            [single] => format!("{}", single),
            [first, .., last] => format!("{} ... {}", first, last),
        },
        CoordValues::Time(v) => match v.as_slice() {
            [] => "*empty*".to_string(),
            [single] => single.to_string(),
            [first, .., last] => format!("{} ... {}", first, last),
        },
        CoordValues::Unread { len } => format!("... ({} values)", len),
    }
}

/// Apply a row limit, eliding the middle with a marker line.
fn limited<T>(items: &[T], max_rows: usize, render: impl Fn(&T) -> String) -> Vec<String> {
    if items.len() <= max_rows || max_rows < 2 {
        return items.iter().map(render).collect();
    }
    let head = max_rows / 2;
    let tail = max_rows - head - 1;
    let mut out: Vec<String> = items[..head].iter().map(&render).collect();
    out.push("    ...".to_string());
    out.extend(items[items.len() - tail..].iter().map(&render));
    out
}

fn column_width(dset: &Dataset) -> usize {
    let longest = dset
        .coords()
        .iter()
        .map(|c| c.name.len())
        .chain(dset.data_vars().iter().map(|v| v.name.len()))
        .max()
        .unwrap_or(0);
    longest + 4
}

/// HTML fragment representation of a dataset.
pub fn dataset_repr_html(dset: &Dataset, title: &str) -> String {
    let mut out = vec![
        "<div class='xr-wrap'>".to_string(),
        format!(
            "<div class='xr-header'><div class='xr-obj-type'>{}</div></div>",
            escape_html(title)
        ),
        "<ul class='xr-sections'>".to_string(),
    ];

    let dims: Vec<String> = dset
        .dim_sizes()
        .iter()
        .map(|(name, size)| format!("<span>{}</span>: {}", escape_html(name), size))
        .collect();
    out.push(format!(
        "<li class='xr-section-item xr-dims'>Dimensions: ({})</li>",
        dims.join(", ")
    ));

    out.push("<li class='xr-section-item'>Coordinates:<ul class='xr-var-list'>".to_string());
    for coord in dset.coords() {
        out.push(variable_entry_html(
            &coord.name,
            &format!("({})", coord.name),
            &coord.dtype,
            &axis_preview(&coord.values),
            &coord.attrs,
        ));
    }
    out.push("</ul></li>".to_string());

    out.push("<li class='xr-section-item'>Data variables:<ul class='xr-var-list'>".to_string());
    for var in dset.data_vars() {
        out.push(variable_entry_html(
            &var.name,
            &format!("({})", var.dims.join(", ")),
            &var.dtype,
            "...",
            &var.attrs,
        ));
    }
    out.push("</ul></li>".to_string());

    if !dset.attrs.is_empty() {
        out.push("<li class='xr-section-item'>Attributes:<dl class='xr-attrs'>".to_string());
        for (key, value) in &dset.attrs {
            out.push(format!(
                "<dt>{}</dt><dd>{}</dd>",
                escape_html(key),
                escape_html(value)
            ));
        }
        out.push("</dl></li>".to_string());
    }

    out.push("</ul></div>".to_string());
    out.join("\n")
}

fn variable_entry_html(
    name: &str,
    dims: &str,
    dtype: &str,
    preview: &str,
    attrs: &crate::dataset::Attrs,
) -> String {
    let mut out = vec![format!(
        "<li class='xr-var-item'><span class='xr-var-name'>{}</span> \
         <span class='xr-var-dims'>{}</span> \
         <span class='xr-var-dtype'>{}</span> \
         <span class='xr-var-preview'>{}</span>",
        escape_html(name),
        escape_html(dims),
        escape_html(dtype),
        escape_html(preview),
    )];
    out.push(
        "<svg class='icon xr-icon-file-text2'><use xlink:href='#icon-file-text2'></use></svg>"
            .to_string(),
    );
    out.push(
        "<svg class='icon xr-icon-database'><use xlink:href='#icon-database'></use></svg>"
            .to_string(),
    );
    if !attrs.is_empty() {
        out.push("<dl class='xr-attrs'>".to_string());
        for (key, value) in attrs {
            out.push(format!(
                "<dt>{}</dt><dd>{}</dd>",
                escape_html(key),
                escape_html(value)
            ));
        }
        out.push("</dl>".to_string());
    }
    out.push("</li>".to_string());
    out.join("")
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Cosmetic substitutions on the rendered text: icon glyphs become Font
/// Awesome markup and numeric-library prefixes are stripped from dtype
/// names carried over from upstream metadata.
pub fn apply_substitutions(rendered: &str) -> String {
    const REPLACEMENTS: [(&str, &str); 6] = [
        (
            "<svg class='icon xr-icon-file-text2'>",
            "<i class='fa fa-file-text-o'>",
        ),
        ("<svg class='icon xr-icon-database'>", "<i class='fa fa-database'>"),
        ("</use></svg>", "</use></i>"),
        ("numpy.", ""),
        ("np.", ""),
        ("dask.", ""),
    ];
    let mut out = rendered.to_string();
    for (from, to) in REPLACEMENTS {
        out = out.replace(from, to);
    }
    out
}
