//! Chart descriptions handed to the plot renderer.

use serde::Serialize;
use shared::{
    domain::ReachId,
    protocol::{ForecastResponse, RetrospectiveResponse},
};

use crate::error::ViewerError;

const UNCERTAINTY_FILL: &str = "rgba(44,182,255,0.6)";
const UNCERTAINTY_LINE: &str = "rgb(0,166,255)";
const TRANSPARENT: &str = "rgba(0,0,0,0)";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub x: Vec<String>,
    pub y: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_color: Option<String>,
    pub show_legend: bool,
}

impl Series {
    fn line(name: &str, x: Vec<String>, y: Vec<f64>) -> Self {
        Self {
            name: name.to_string(),
            x,
            y,
            fill_color: None,
            line_color: None,
            show_legend: true,
        }
    }

    fn colored(mut self, color: &str) -> Self {
        self.line_color = Some(color.to_string());
        self
    }

    fn hidden_from_legend(mut self) -> Self {
        self.show_legend = false;
        self
    }

    /// Whether the series is drawn as a closed, filled polygon.
    pub fn is_filled(&self) -> bool {
        self.fill_color.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_axis_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_axis_title: Option<String>,
    pub series: Vec<Series>,
}

pub fn build_forecast_chart(reach_id: ReachId, forecast: &ForecastResponse) -> Chart {
    let times = &forecast.datetime;

    // Band polygon: lower bound left to right, then upper bound back again.
    let band_x = times.iter().chain(times.iter().rev()).cloned().collect();
    let band_y = forecast
        .flow_uncertainty_lower
        .iter()
        .chain(forecast.flow_uncertainty_upper.iter().rev())
        .copied()
        .collect();
    let band = Series {
        fill_color: Some(UNCERTAINTY_FILL.to_string()),
        ..Series::line("Uncertainty Interval", band_x, band_y).colored(TRANSPARENT)
    };

    Chart {
        title: Some(format!("River Forecast for {reach_id}")),
        x_axis_title: Some("Date (UTC +00:00)".to_string()),
        y_axis_title: Some("Discharge (m³/s)".to_string()),
        series: vec![
            band,
            Series::line(
                "Uncertainty Lower",
                times.clone(),
                forecast.flow_uncertainty_lower.clone(),
            )
            .colored(UNCERTAINTY_LINE)
            .hidden_from_legend(),
            Series::line(
                "Uncertainty Upper",
                times.clone(),
                forecast.flow_uncertainty_upper.clone(),
            )
            .colored(UNCERTAINTY_LINE)
            .hidden_from_legend(),
            Series::line("Predicted Flow", times.clone(), forecast.flow_median.clone())
                .colored("black"),
        ],
    }
}

pub fn build_retrospective_chart(
    reach_id: ReachId,
    retrospective: &RetrospectiveResponse,
) -> Result<Chart, ViewerError> {
    let flows = retrospective
        .flows(reach_id)
        .ok_or(ViewerError::MissingColumn(reach_id))?;
    Ok(Chart {
        title: None,
        x_axis_title: None,
        y_axis_title: None,
        series: vec![Series::line(
            &reach_id.to_string(),
            retrospective.datetime.clone(),
            flows,
        )],
    })
}

#[cfg(test)]
#[path = "tests/charts_tests.rs"]
mod tests;
