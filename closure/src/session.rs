use nalgebra::RealField;
use num::ToPrimitive;
use solid_common::{
    feature::Feature, filter::ApproxFilter, point::Point, point_cloud::PointCloud, SolidConfig,
};
use solid_features::{Degeneracy, SolidEstimation};
use solid_filters::Preprocess;

use crate::{
    ClosureEngine, Comparison, DescriptorDatabase, GroundTruth, PredictedClosures, SessionError,
    ThresholdMetrics, ThresholdSet,
};

/// What happened to one processed scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOutcome<T> {
    pub index: usize,
    pub degeneracy: Degeneracy,
    /// Number of candidates the scan was compared against.
    pub compared: usize,
    /// Comparisons that passed at least one threshold, in candidate order.
    pub closures: Vec<Comparison<T>>,
}

/// The running state of one loop-closure run. Scans are fed in sequence
/// order; [`Session::finish`] turns the state into [`RunResults`].
#[derive(Debug, Clone)]
pub struct Session<T: RealField> {
    estimation: SolidEstimation<T>,
    engine: ClosureEngine<T>,
    preprocess: Option<Preprocess<T>>,
    database: DescriptorDatabase<T>,
    predicted: PredictedClosures<T>,
    comparisons: Vec<Comparison<T>>,
    closures: Vec<Comparison<T>>,
    keep_comparisons: bool,
    degenerate: usize,
}

impl<T> Session<T>
where
    T: RealField + Copy + ToPrimitive,
{
    pub fn new(estimation: SolidEstimation<T>, engine: ClosureEngine<T>) -> Self {
        let predicted = PredictedClosures::new(engine.thresholds().clone());
        Session {
            estimation,
            engine,
            preprocess: None,
            database: DescriptorDatabase::new(),
            predicted,
            comparisons: Vec::new(),
            closures: Vec::new(),
            keep_comparisons: true,
            degenerate: 0,
        }
    }

    /// A session with preprocessing enabled, every part built from `config`.
    pub fn from_config(config: &SolidConfig) -> Result<Self, SessionError> {
        let session = Self::new(
            SolidEstimation::from_config(config)?,
            ClosureEngine::from_config(config)?,
        );
        Ok(session.with_preprocess(Preprocess::from_config(config)?))
    }

    pub fn with_preprocess(mut self, preprocess: Preprocess<T>) -> Self {
        self.preprocess = Some(preprocess);
        self
    }

    /// Whether every comparison is recorded, not only the closures. On by
    /// default; long runs may turn it off, as the log grows quadratically.
    pub fn keep_comparisons(mut self, keep: bool) -> Self {
        self.keep_comparisons = keep;
        self
    }

    /// Index the next processed scan will get.
    #[inline]
    pub fn next_index(&self) -> usize {
        self.database.len()
    }

    #[inline]
    pub fn thresholds(&self) -> &ThresholdSet<T> {
        self.engine.thresholds()
    }

    #[inline]
    pub fn database(&self) -> &DescriptorDatabase<T> {
        &self.database
    }

    #[inline]
    pub fn predicted(&self) -> &PredictedClosures<T> {
        &self.predicted
    }

    /// Describes an already filtered scan, stores its descriptor and compares
    /// it against the history.
    pub fn process<P>(&mut self, scan: &PointCloud<P>) -> ScanOutcome<T>
    where
        P: Point<Data = T>,
    {
        let descriptor = self.estimation.compute(scan);
        let degeneracy = descriptor.degeneracy;
        if !degeneracy.is_clean() {
            self.degenerate += 1;
        }
        let index = self.database.push(descriptor);

        let comparisons = self.engine.evaluate(index, &self.database);
        let compared = comparisons.len();
        let closures = { comparisons.iter() }
            .filter(|comparison| comparison.is_closure())
            .cloned()
            .collect::<Vec<_>>();

        for closure in &closures {
            self.predicted.insert(closure);
            log::info!(
                "session: closure {} -> {} at distance {:?}, heading {:?}",
                closure.candidate,
                closure.query,
                closure.distance,
                closure.heading.map(|heading| heading.degrees)
            );
        }
        log::debug!(
            "session: scan {index}: {} points, {compared} candidates, {} closures",
            scan.len(),
            closures.len()
        );

        if self.keep_comparisons {
            self.comparisons.extend(comparisons);
        }
        self.closures.extend_from_slice(&closures);

        ScanOutcome {
            index,
            degeneracy,
            compared,
            closures,
        }
    }

    /// Like [`Session::process`], but checks that `index` is the scan the
    /// session expects next.
    pub fn process_at<P>(
        &mut self,
        index: usize,
        scan: &PointCloud<P>,
    ) -> Result<ScanOutcome<T>, SessionError>
    where
        P: Point<Data = T>,
    {
        let expected = self.next_index();
        if index != expected {
            return Err(SessionError::OutOfOrder {
                expected,
                got: index,
            });
        }
        Ok(self.process(scan))
    }

    /// Runs the preprocessing chain, if any, before [`Session::process`].
    pub fn process_raw<P>(&mut self, scan: &PointCloud<P>) -> ScanOutcome<T>
    where
        P: Point<Data = T> + Default + Sync,
    {
        match self.preprocess.as_mut().map(|preprocess| preprocess.filter(scan)) {
            Some(filtered) => self.process(&filtered),
            None => self.process(scan),
        }
    }

    /// Ends the run. Metrics are only computed if ground truth is given.
    pub fn finish(self, ground_truth: Option<&GroundTruth>) -> RunResults<T> {
        let metrics = ground_truth
            .map(|ground_truth| self.predicted.compute_metrics(ground_truth))
            .unwrap_or_default();
        log::info!(
            "session: finished after {} scans, {} closures flagged, {} degenerate scans",
            self.database.len(),
            self.closures.len(),
            self.degenerate
        );
        RunResults {
            predicted: self.predicted,
            comparisons: self.comparisons,
            closures: self.closures,
            metrics,
            descriptors: self.database,
            degenerate: self.degenerate,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunResults<T: RealField> {
    pub predicted: PredictedClosures<T>,
    /// Every comparison in `(query, candidate)` order, unless the session was
    /// told not to keep them.
    pub comparisons: Vec<Comparison<T>>,
    /// Comparisons that passed at least one threshold.
    pub closures: Vec<Comparison<T>>,
    /// Empty without ground truth.
    pub metrics: Vec<ThresholdMetrics<T>>,
    pub descriptors: DescriptorDatabase<T>,
    /// Scans whose descriptor hit any [`Degeneracy`].
    pub degenerate: usize,
}

impl<T: RealField + Copy> RunResults<T> {
    #[inline]
    pub fn thresholds(&self) -> &ThresholdSet<T> {
        self.predicted.thresholds()
    }

    #[inline]
    pub fn scans(&self) -> usize {
        self.descriptors.len()
    }

    /// Scores the run against `ground_truth`, replacing any earlier metrics.
    pub fn evaluate(&mut self, ground_truth: &GroundTruth) -> &[ThresholdMetrics<T>] {
        self.metrics = self.predicted.compute_metrics(ground_truth);
        &self.metrics
    }

    /// Closures under the threshold at `index`.
    pub fn closures_at(&self, index: usize) -> impl Iterator<Item = &Comparison<T>> + '_ {
        { self.closures.iter() }.filter(move |closure| closure.passes(index))
    }
}
