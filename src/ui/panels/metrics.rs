// Metrics panel
//
// Two streams: one lists every metric of the account and buckets it into a
// namespace tree, the other fetches datapoints for the metric being graphed.
// Picking another metric restarts the graph stream, abandoning the previous
// query; its late pages never reach the plot.

use super::{ErrorPanel, PanelContext};
use crate::models::{Dimension, Metric, MetricDataPage};
use crate::services::{ApiError, fetch};
use crate::task::AsyncStream;
use chrono::Utc;
use std::collections::BTreeMap;

/// Items pulled from each stream per frame
pub const MAX_PULLS_PER_FRAME: usize = 32;

/// namespace -> metric name -> every dimension combination of that metric
pub type NamespaceTree = BTreeMap<String, BTreeMap<String, Vec<Metric>>>;

/// One line of the metric list
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRow {
    pub namespace: String,
    pub name: String,
    pub dimensions: String,
    pub provider: bool,
}

/// Datapoints of the metric being graphed
#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    pub query_id: String,
    pub metric: Metric,

    /// (seconds since epoch, value), oldest first
    pub points: Vec<(f64, f64)>,
}

impl Graph {
    fn new(query_id: String, metric: Metric) -> Self {
        Self {
            query_id,
            metric,
            points: Vec::new(),
        }
    }

    /// Append the datapoints of `page` that answer this graph's query.
    fn extend(&mut self, page: MetricDataPage) -> usize {
        let before = self.points.len();
        for result in page.results.into_iter().filter(|r| r.id == self.query_id) {
            self.points.extend(
                result
                    .timestamps_ms
                    .iter()
                    .zip(result.values.iter())
                    .map(|(t, v)| (*t as f64 / 1000.0, *v)),
            );
        }
        self.points.len() - before
    }

    /// (min, max) of the values, or `None` without datapoints.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.points.iter().map(|(_, v)| *v).fold(None, |range, v| match range {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }

    /// SVG path commands drawing the series scaled into a `width` x `height` box.
    ///
    /// Y grows downwards, so the maximum value sits on the top edge. Returns an
    /// empty string when there is nothing to draw.
    pub fn svg_path(&self, width: f64, height: f64) -> String {
        let (Some((first_x, _)), Some((last_x, _))) = (self.points.first(), self.points.last()) else {
            return String::new();
        };
        let Some((lo, hi)) = self.value_range() else {
            return String::new();
        };

        let x_span = (last_x - first_x).max(f64::EPSILON);
        let y_span = (hi - lo).max(f64::EPSILON);

        let mut path = String::new();
        for (i, (x, y)) in self.points.iter().enumerate() {
            let px = (x - first_x) / x_span * width;
            let py = height - (y - lo) / y_span * height;
            let command = if i == 0 { 'M' } else { 'L' };
            path.push_str(&format!("{} {:.1} {:.1} ", command, px, py));
        }
        path.trim_end().to_string()
    }
}

pub struct MetricsPanel {
    context: PanelContext,
    open: bool,
    listing: AsyncStream<Metric, ApiError>,
    provider: NamespaceTree,
    user: NamespaceTree,
    graph_data: AsyncStream<MetricDataPage, ApiError>,
    graph: Option<Graph>,
    queries: u64,
}

impl MetricsPanel {
    /// Open the panel and start listing metrics right away.
    pub fn new(context: PanelContext) -> Self {
        let mut panel = Self {
            context,
            open: true,
            listing: AsyncStream::new("metrics"),
            provider: NamespaceTree::new(),
            user: NamespaceTree::new(),
            graph_data: AsyncStream::new("metric-data"),
            graph: None,
            queries: 0,
        };
        panel.fetch();
        panel
    }

    /// Re-list all metrics. Ignored while a listing is running.
    pub fn fetch(&mut self) -> bool {
        if self.listing.is_working() {
            return false;
        }

        self.provider.clear();
        self.user.clear();

        let context = self.context.clone();
        self.listing
            .run(move |sink| fetch::fetch_all_metrics(context.factory.as_ref(), &context.session, sink))
            .is_some()
    }

    /// Graph `metric`, abandoning any query still in flight.
    pub fn graph(&mut self, metric: Metric) -> bool {
        self.queries += 1;
        let query = fetch::metric_query(
            format!("q{}", self.queries),
            metric.clone(),
            self.context.settings,
            Utc::now().timestamp_millis(),
        );
        tracing::debug!("Graphing {}/{} as {}", metric.namespace, metric.name, query.id);

        self.graph = Some(Graph::new(query.id.clone(), metric));

        let context = self.context.clone();
        self.graph_data
            .restart(move |sink| fetch::fetch_metric_data(context.factory.as_ref(), &context.session, query, sink))
            .is_some()
    }

    /// Graph the metric shown at `index` of [`rows`](Self::rows).
    pub fn graph_row(&mut self, index: usize) -> bool {
        let metric = self.listed().get(index).map(|metric| (*metric).clone());
        match metric {
            Some(metric) => self.graph(metric),
            None => false,
        }
    }

    /// Per-frame update. Returns whether the tree or the graph changed.
    pub fn tick(&mut self, source: &str, errors: &mut ErrorPanel) -> bool {
        let mut changed = false;

        for _ in 0..MAX_PULLS_PER_FRAME {
            let Some(metric) = self.listing.pull_item() else {
                break;
            };
            self.insert(metric);
            changed = true;
        }

        for _ in 0..MAX_PULLS_PER_FRAME {
            let Some(page) = self.graph_data.pull_item() else {
                break;
            };
            if let Some(graph) = &mut self.graph {
                changed |= graph.extend(page) > 0;
            }
        }

        if let Some(error) = self.listing.take_error() {
            errors.push(source, error);
        }
        if let Some(error) = self.graph_data.take_error() {
            errors.push(format!("{} (graph)", source), error);
        }

        changed
    }

    fn insert(&mut self, metric: Metric) {
        let tree = if metric.is_provider_metric() {
            &mut self.provider
        } else {
            &mut self.user
        };
        tree.entry(metric.namespace.clone())
            .or_default()
            .entry(metric.name.clone())
            .or_default()
            .push(metric);
    }

    pub fn provider_namespaces(&self) -> &NamespaceTree {
        &self.provider
    }

    pub fn user_namespaces(&self) -> &NamespaceTree {
        &self.user
    }

    /// Every listed metric in display order: provider namespaces first, then the
    /// user's, each sorted by namespace and metric name.
    pub fn listed(&self) -> Vec<&Metric> {
        self.provider
            .values()
            .chain(self.user.values())
            .flat_map(|names| names.values())
            .flatten()
            .collect()
    }

    pub fn rows(&self) -> Vec<MetricRow> {
        self.listed()
            .into_iter()
            .map(|metric| MetricRow {
                namespace: metric.namespace.clone(),
                name: metric.name.clone(),
                dimensions: format_dimensions(&metric.dimensions),
                provider: metric.is_provider_metric(),
            })
            .collect()
    }

    pub fn graph_state(&self) -> Option<&Graph> {
        self.graph.as_ref()
    }

    pub fn is_working(&self) -> bool {
        self.listing.is_working() || self.graph_data.is_working()
    }

    /// Working, or still holding undelivered items.
    pub fn is_loading(&self) -> bool {
        self.is_working() || self.listing.pending() > 0 || self.graph_data.pending() > 0
    }

    pub fn status(&self) -> String {
        let count = self.listed().len();
        if self.listing.is_working() {
            format!("Loading metrics... ({})", count)
        } else if self.graph_data.is_working() {
            format!("{} metrics, loading datapoints...", count)
        } else {
            format!("{} metrics", count)
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Mark the panel closed and stop both streams.
    pub fn close(&mut self) {
        self.open = false;
        self.listing.cancel();
        self.graph_data.cancel();
    }
}

/// `name=value` pairs joined for display.
pub fn format_dimensions(dimensions: &[Dimension]) -> String {
    dimensions
        .iter()
        .map(|d| format!("{}={}", d.name, d.value))
        .collect::<Vec<_>>()
        .join(", ")
}
