//! ECharts bar charts for the statistics page.
//!
//! Each chart is generated as a JSON configuration for the ECharts library and
//! rendered with a matching HTML container and initialization script.

use charming::{
    Chart,
    component::{Axis, Grid, Title},
    element::{
        AxisLabel, AxisPointer, AxisPointerType, AxisType, JsFunction, Tooltip, Trigger,
    },
    series::bar,
};
use maud::{Markup, PreEscaped, html};

use crate::{html::HeadElement, statistics::chart_data::ChartData};

/// A chart with its HTML container ID and ECharts configuration.
pub(super) struct StatisticsChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
}

/// Renders the HTML containers for `charts`.
pub(super) fn charts_view(charts: &[StatisticsChart]) -> Markup {
    html!(
        section
            id="charts"
            class="w-full mx-auto mb-4"
        {
            div class="grid grid-cols-1 xl:grid-cols-2 gap-4"
            {
                @for chart in charts {
                    div
                        id=(chart.id)
                        class="min-h-[380px] rounded dark:bg-gray-100"
                    {}
                }
            }
        }
    )
}

/// Generates the JavaScript that initializes an ECharts instance for each
/// chart once the page has loaded.
pub(super) fn charts_script(charts: &[StatisticsChart]) -> HeadElement {
    let script_content = charts
        .iter()
        .map(|chart| {
            format!(
                r#"(function() {{
                    const chart = echarts.init(document.getElementById("{}"));
                    chart.setOption({});
                    window.addEventListener('resize', chart.resize);
                }})();"#,
                chart.id, chart.options
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let wrapped_script = format!(
        "document.addEventListener('DOMContentLoaded', function() {{\n{script_content}\n}});"
    );

    HeadElement::ScriptSource(PreEscaped(wrapped_script))
}

/// A bar chart of the totals in `data`, one bar per label.
pub(super) fn totals_bar_chart(title: &str, series_name: &str, data: ChartData) -> Chart {
    Chart::new()
        .title(Title::new().text(title))
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Axis)
                .value_formatter(currency_formatter())
                .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow)),
        )
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .contain_label(true),
        )
        .x_axis(Axis::new().type_(AxisType::Category).data(data.labels))
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter())),
        )
        .series(bar::Bar::new().name(series_name).data(data.amounts))
}

fn currency_formatter() -> JsFunction {
    JsFunction::new_with_args(
        "number",
        "const currencyFormatter = new Intl.NumberFormat('en-US', {
              style: 'currency',
              currency: 'USD'
            });
            return (number) ? currencyFormatter.format(number) : \"-\";",
    )
}

#[cfg(test)]
mod tests {
    use crate::{
        html::HeadElement,
        statistics::chart_data::ChartData,
    };

    use super::{StatisticsChart, charts_script, totals_bar_chart};

    #[test]
    fn bar_chart_options_contain_labels_and_amounts() {
        let chart = totals_bar_chart(
            "Monthly",
            "Total",
            ChartData {
                labels: vec!["Mar 2024".to_owned(), "Apr 2024".to_owned()],
                amounts: vec![70.0, -5.0],
            },
        );

        let options = chart.to_string();

        assert!(options.contains("Mar 2024"), "got options {options}");
        assert!(options.contains("Apr 2024"), "got options {options}");
        assert!(options.contains("\"bar\""), "got options {options}");
    }

    #[test]
    fn script_initializes_every_chart() {
        let charts = [
            StatisticsChart {
                id: "daily-chart",
                options: "{}".to_owned(),
            },
            StatisticsChart {
                id: "monthly-chart",
                options: "{}".to_owned(),
            },
        ];

        let HeadElement::ScriptSource(script) = charts_script(&charts) else {
            panic!("want a script source");
        };

        assert!(script.0.contains("getElementById(\"daily-chart\")"));
        assert!(script.0.contains("getElementById(\"monthly-chart\")"));
    }
}
