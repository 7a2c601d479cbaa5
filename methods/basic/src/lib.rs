use extraction::{
    require_f64, CountData, ExtractedPulses, MethodDecl, MethodError, MethodSource, ParamMap,
    ParamSpec,
};

const CONV_DERIV_PARAMS: &[ParamSpec] = &[ParamSpec {
    name: "conv_std_dev",
    default: Some(20.0),
}];

const THRESHOLD_PARAMS: &[ParamSpec] = &[ParamSpec {
    name: "count_threshold",
    default: Some(10.0),
}];

/// The stock extraction methods shipped with every installation.
pub struct BasicMethods;

impl MethodSource for BasicMethods {
    fn source_name(&self) -> &str {
        "basic_methods"
    }

    fn method_decls(&self) -> Vec<MethodDecl> {
        vec![
            MethodDecl {
                raw_name: "ungated_conv_deriv",
                params: CONV_DERIV_PARAMS,
                func: ungated_conv_deriv,
            },
            MethodDecl {
                raw_name: "ungated_threshold",
                params: THRESHOLD_PARAMS,
                func: ungated_threshold,
            },
            MethodDecl {
                raw_name: "gated_conv_deriv",
                params: CONV_DERIV_PARAMS,
                func: gated_conv_deriv,
            },
            MethodDecl {
                raw_name: "gated_threshold",
                params: THRESHOLD_PARAMS,
                func: gated_threshold,
            },
        ]
    }
}

fn ungated_trace<'a>(data: &'a CountData, method: &str) -> Result<&'a [f64], MethodError> {
    match data {
        CountData::Ungated(trace) => Ok(trace),
        CountData::Gated(_) => Err(MethodError::WrongDataShape {
            method: method.to_string(),
            expected: "ungated",
        }),
    }
}

/// Element-wise sum over all gates, padded to the widest row.
fn summed_gates(data: &CountData, method: &str) -> Result<Vec<f64>, MethodError> {
    match data {
        CountData::Gated(rows) => {
            let width = rows.iter().map(Vec::len).max().unwrap_or(0);
            let mut sum = vec![0.0; width];
            for row in rows {
                for (bin, value) in row.iter().enumerate() {
                    sum[bin] += value;
                }
            }
            Ok(sum)
        }
        CountData::Ungated(_) => Err(MethodError::WrongDataShape {
            method: method.to_string(),
            expected: "gated",
        }),
    }
}

fn ungated_conv_deriv(data: &CountData, kwargs: &ParamMap) -> Result<ExtractedPulses, MethodError> {
    let conv_std_dev = require_f64(kwargs, "ungated_conv_deriv", "conv_std_dev")?;
    let trace = ungated_trace(data, "ungated_conv_deriv")?;
    Ok(conv_deriv(trace, conv_std_dev))
}

fn gated_conv_deriv(data: &CountData, kwargs: &ParamMap) -> Result<ExtractedPulses, MethodError> {
    let conv_std_dev = require_f64(kwargs, "gated_conv_deriv", "conv_std_dev")?;
    let trace = summed_gates(data, "gated_conv_deriv")?;
    Ok(conv_deriv(&trace, conv_std_dev))
}

fn ungated_threshold(data: &CountData, kwargs: &ParamMap) -> Result<ExtractedPulses, MethodError> {
    let count_threshold = require_f64(kwargs, "ungated_threshold", "count_threshold")?;
    let trace = ungated_trace(data, "ungated_threshold")?;
    Ok(threshold(trace, count_threshold))
}

fn gated_threshold(data: &CountData, kwargs: &ParamMap) -> Result<ExtractedPulses, MethodError> {
    let count_threshold = require_f64(kwargs, "gated_threshold", "count_threshold")?;
    let trace = summed_gates(data, "gated_threshold")?;
    Ok(threshold(&trace, count_threshold))
}

/// Smooths the trace, takes the discrete derivative and marks the local
/// extrema that reach half of the strongest slope as pulse edges.
fn conv_deriv(trace: &[f64], conv_std_dev: f64) -> ExtractedPulses {
    if trace.len() < 2 {
        return ExtractedPulses::default();
    }
    let window = (conv_std_dev.round().max(1.0) as usize).min(trace.len());
    let smoothed = moving_average(trace, window);
    let deriv: Vec<f64> = smoothed.windows(2).map(|pair| pair[1] - pair[0]).collect();
    let max = deriv.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let min = deriv.iter().cloned().fold(f64::INFINITY, f64::min);

    let mut pulses = ExtractedPulses::default();
    for (i, value) in deriv.iter().enumerate() {
        if max > 0.0 && *value >= max / 2.0 {
            let left = if i == 0 { f64::NEG_INFINITY } else { deriv[i - 1] };
            let right = if i + 1 == deriv.len() {
                f64::NEG_INFINITY
            } else {
                deriv[i + 1]
            };
            if *value >= left && *value > right {
                pulses.rising_ind.push(i);
            }
        }
        if min < 0.0 && *value <= min / 2.0 {
            let left = if i == 0 { f64::INFINITY } else { deriv[i - 1] };
            let right = if i + 1 == deriv.len() {
                f64::INFINITY
            } else {
                deriv[i + 1]
            };
            if *value <= left && *value < right {
                pulses.falling_ind.push(i);
            }
        }
    }
    pulses
}

/// Contiguous runs of bins at or above the threshold; run boundaries are
/// the pulse edges.
fn threshold(trace: &[f64], count_threshold: f64) -> ExtractedPulses {
    let mut pulses = ExtractedPulses::default();
    let mut inside = false;
    for (i, value) in trace.iter().enumerate() {
        let above = *value >= count_threshold;
        if above && !inside {
            pulses.rising_ind.push(i);
            inside = true;
        } else if !above && inside {
            pulses.falling_ind.push(i - 1);
            inside = false;
        }
    }
    if inside {
        pulses.falling_ind.push(trace.len() - 1);
    }
    pulses
}

fn moving_average(trace: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    let mut out = Vec::with_capacity(trace.len());
    let mut sum = 0.0;
    for i in 0..trace.len() {
        sum += trace[i];
        if i >= window {
            sum -= trace[i - window];
        }
        out.push(sum / (i + 1).min(window) as f64);
    }
    out
}
