//! Chart generation and rendering for the dashboard.
//!
//! This module creates interactive ECharts visualizations:
//! - **Expenses by category**: Pie chart for the selected breakdown period
//! - **Monthly overview**: Income and expense totals for the last twelve months
//!
//! Each chart is generated as JSON configuration for the ECharts library and
//! rendered with a HTML container and JavaScript initialization code.

use charming::{
    Chart,
    component::{Axis, Grid, Legend, Title},
    element::{
        AxisLabel, AxisPointer, AxisPointerType, AxisType, JsFunction, Tooltip, Trigger,
    },
    series::{Line, Pie},
};
use maud::{Markup, PreEscaped, html};

use crate::dashboard::aggregation::{CategoryShare, MonthlyOverview};

/// A dashboard chart with its HTML container ID and ECharts configuration.
pub(super) struct DashboardChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
}

/// Renders the HTML container for a single chart.
pub(super) fn chart_container(chart: &DashboardChart) -> Markup {
    html!(
        div
            id=(chart.id)
            class="min-h-[380px] rounded dark:bg-gray-100"
        {}
    )
}

/// Generates the script that initializes ECharts instances for `charts`.
///
/// The script runs where it is placed, so it must come after the chart
/// containers. It is part of the swapped content so that charts are rebuilt
/// when htmx refreshes the dashboard.
pub(super) fn charts_script(charts: &[DashboardChart]) -> Markup {
    let script_content = charts
        .iter()
        .map(|chart| {
            format!(
                r#"(function() {{
                    const chartDom = document.getElementById("{}");
                    if (!chartDom || typeof echarts === "undefined") {{ return; }}
                    const chart = echarts.init(chartDom);
                    const option = {};
                    chart.setOption(option);

                    window.addEventListener('resize', chart.resize);

                    const darkModeMediaQuery = window.matchMedia('(prefers-color-scheme: dark)');
                    const updateTheme = () => {{
                        const isDarkMode = darkModeMediaQuery.matches;
                        chart.setTheme(isDarkMode ? 'dark' : 'default');
                    }}
                    darkModeMediaQuery.addEventListener('change', updateTheme);
                    updateTheme();
                }})();"#,
                chart.id, chart.options
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    html! {
        script { (PreEscaped(script_content)) }
    }
}

pub(super) fn expenses_pie_chart(shares: &[CategoryShare], subtitle: &str) -> Chart {
    let data: Vec<(f64, &str)> = shares
        .iter()
        .map(|share| (share.amount, share.category.as_str()))
        .collect();

    Chart::new()
        .title(
            Title::new()
                .text("Expenses by category")
                .subtext(subtitle),
        )
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Item)
                .value_formatter(currency_formatter()),
        )
        .series(Pie::new().name("Expenses").radius("65%").data(data))
}

pub(super) fn monthly_overview_chart(overview: &MonthlyOverview) -> Chart {
    Chart::new()
        .title(
            Title::new()
                .text("Monthly overview")
                .subtext("Last twelve months"),
        )
        .tooltip(currency_tooltip())
        .legend(Legend::new().top("1%"))
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .top(90)
                .contain_label(true),
        )
        .x_axis(
            Axis::new()
                .type_(AxisType::Category)
                .data(overview.labels.clone()),
        )
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter())),
        )
        .series(Line::new().name("Income").data(overview.income.clone()))
        .series(Line::new().name("Expenses").data(overview.expenses.clone()))
}

#[inline]
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

/// Creates a tooltip configuration for currency values
fn currency_tooltip() -> Tooltip {
    Tooltip::new()
        .trigger(Trigger::Axis)
        .value_formatter(currency_formatter())
        .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow))
}

#[cfg(test)]
mod charts_tests {
    use crate::dashboard::aggregation::{CategoryShare, MonthlyOverview};

    use super::{DashboardChart, charts_script, expenses_pie_chart, monthly_overview_chart};

    #[test]
    fn pie_chart_includes_categories() {
        let shares = [CategoryShare {
            category: "Groceries".to_owned(),
            amount: 42.0,
            share: 100.0,
        }];

        let options = expenses_pie_chart(&shares, "This month").to_string();

        assert!(options.contains("Groceries"));
        assert!(options.contains("\"pie\""));
    }

    #[test]
    fn overview_chart_has_income_and_expense_lines() {
        let overview = MonthlyOverview {
            labels: vec!["Jan 2025".to_owned()],
            income: vec![10.0],
            expenses: vec![5.0],
        };

        let options = monthly_overview_chart(&overview).to_string();

        assert!(options.contains("Jan 2025"));
        assert!(options.contains("\"Income\""));
        assert!(options.contains("\"Expenses\""));
    }

    #[test]
    fn script_initializes_each_chart() {
        let charts = [
            DashboardChart {
                id: "first-chart",
                options: "{}".to_owned(),
            },
            DashboardChart {
                id: "second-chart",
                options: "{}".to_owned(),
            },
        ];

        let script = charts_script(&charts).into_string();

        assert!(script.contains("getElementById(\"first-chart\")"));
        assert!(script.contains("getElementById(\"second-chart\")"));
    }
}
