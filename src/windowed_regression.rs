use num_traits::Float;

use crate::{Kbn, RegressionError, utils::Deque};

/// A point retained in the window, with the products it contributed to the sums
#[derive(Debug, Clone, Copy, Default)]
struct Point<T> {
    x: T,
    y: T,
    xy: T,
    xx: T,
    yy: T,
}

impl<T: Float> Point<T> {
    #[inline]
    fn new(x: T, y: T) -> Self {
        Self {
            x,
            y,
            xy: x * y,
            xx: x * x,
            yy: y * y,
        }
    }
}

/// Online least-squares linear regression over a trailing window of x span.
///
/// `WindowedRegression<T>` keeps every point whose x lies within `x_delta` of
/// the most recently added x, together with running sums of x, y, x², xy and
/// y² over those points. Adding a point evicts the ones that fell out of the
/// window, so both updates and fits are O(1) amortised regardless of how many
/// points the window holds.
///
/// The window is a function of x alone. Whether x is a timestamp, a sequence
/// number or any other ordered quantity is up to the caller, but points must
/// arrive in non-decreasing x order.
///
/// Degenerate windows are not errors: with fewer than two points, or with
/// every retained x equal, the fit is NaN or infinite as produced by the
/// floating-point arithmetic. The standard error needs at least three points.
#[derive(Debug, Clone)]
pub struct WindowedRegression<T> {
    /// Maximum span in x between the oldest retained point and the newest
    x_delta: T,
    /// Retained points, oldest at the front
    points: Deque<Point<T>>,
    /// x of the most recent accepted point, `None` before the first
    last_x: Option<T>,
    /// Sum of x
    sum_x: Kbn<T>,
    /// Sum of y
    sum_y: Kbn<T>,
    /// Sum of x squares
    sum_xx: Kbn<T>,
    /// Sum of products
    sum_xy: Kbn<T>,
    /// Sum of y squares
    sum_yy: Kbn<T>,
    /// Slope, intercept and standard error of the last fit, `None` once stale
    fit: Option<(T, T, T)>,
}

impl<T> WindowedRegression<T>
where
    T: Default + Float,
{
    /// Creates a new `WindowedRegression` that keeps points back as far as
    /// `x_delta` from the last added x.
    ///
    /// A negative `x_delta` is not rejected, but such a window drains itself
    /// on every add and all fits are NaN.
    ///
    /// # Arguments
    ///
    /// * `x_delta` - The span of the window in x units
    ///
    /// # Returns
    ///
    /// * `Self` - The regression with an empty window
    pub fn new(x_delta: T) -> Self {
        Self {
            x_delta,
            points: Deque::new(),
            last_x: None,
            sum_x: Kbn::default(),
            sum_y: Kbn::default(),
            sum_xx: Kbn::default(),
            sum_xy: Kbn::default(),
            sum_yy: Kbn::default(),
            fit: None,
        }
    }

    /// Returns the span of the window in x units
    ///
    /// # Returns
    ///
    /// * `T` - The window span given at construction
    #[inline]
    pub const fn x_delta(&self) -> T {
        self.x_delta
    }

    /// Returns the x of the most recently added point
    ///
    /// # Returns
    ///
    /// * `Option<T>` - The last x, or `None` if nothing was added since construction or reset
    #[inline]
    pub const fn last_x(&self) -> Option<T> {
        self.last_x
    }

    /// Returns the number of points currently in the window
    #[inline]
    pub const fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if the window holds no points
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns an iterator over the retained `(x, y)` points, oldest first
    pub fn iter(&self) -> impl Iterator<Item = (T, T)> + '_ {
        self.points.iter().map(|p| (p.x, p.y))
    }

    /// Resets the regression to an empty window, keeping `x_delta`
    ///
    /// # Returns
    ///
    /// * `&mut Self` - The regression object
    pub fn reset(&mut self) -> &mut Self {
        self.points.reset();
        self.last_x = None;
        self.reset_sums();
        self.fit = None;
        self
    }

    /// Recomputes the running sums from the retained points, could be called
    /// to avoid prolonged compounding of floating rounding errors
    ///
    /// # Returns
    ///
    /// * `&mut Self` - The regression object
    pub fn recompute(&mut self) -> &mut Self {
        self.reset_sums();

        let Self {
            points,
            sum_x,
            sum_y,
            sum_xx,
            sum_xy,
            sum_yy,
            ..
        } = self;
        for p in points.iter() {
            *sum_x += p.x;
            *sum_y += p.y;
            *sum_xx += p.xx;
            *sum_xy += p.xy;
            *sum_yy += p.yy;
        }

        self.fit = None;
        self
    }

    #[inline]
    fn reset_sums(&mut self) {
        self.sum_x = Kbn::default();
        self.sum_y = Kbn::default();
        self.sum_xx = Kbn::default();
        self.sum_xy = Kbn::default();
        self.sum_yy = Kbn::default();
    }

    /// Adds a point to the window and evicts the points that fell out of it
    ///
    /// Points older than `x_delta` relative to `x` are removed; a point
    /// exactly on the boundary stays.
    ///
    /// # Arguments
    ///
    /// * `x` - The x of the point, not less than the x of the previous add
    /// * `y` - The y of the point
    ///
    /// # Returns
    ///
    /// * `Result<&mut Self, RegressionError>` - The regression object, or
    ///   `RegressionError::InvalidOrder` if `x` is less than the last added x,
    ///   in which case nothing is changed
    ///
    /// # Examples
    ///
    /// ```
    /// use windowed_regression::{RegressionError, WindowedRegression};
    ///
    /// let mut reg = WindowedRegression::new(1.0);
    /// reg.add(1.0, 1.0)?.add(2.0, 2.0)?.add(3.0, 1.0)?;
    ///
    /// // x = 1 is older than 3 - 1 and was evicted
    /// assert_eq!(reg.len(), 2);
    ///
    /// assert!(matches!(
    ///     reg.add(2.5, 0.0),
    ///     Err(RegressionError::InvalidOrder { .. })
    /// ));
    /// assert_eq!(reg.last_x(), Some(3.0));
    /// # Ok::<(), RegressionError>(())
    /// ```
    pub fn add(&mut self, x: T, y: T) -> Result<&mut Self, RegressionError> {
        if let Some(last_x) = self.last_x.filter(|&last_x| x < last_x) {
            let err = RegressionError::InvalidOrder {
                x: num_traits::cast(x).unwrap_or(f64::NAN),
                last_x: num_traits::cast(last_x).unwrap_or(f64::NAN),
            };
            log::warn!("rejected point: {err}");
            return Err(err);
        }

        self.fit = None;
        self.last_x = Some(x);

        let point = Point::new(x, y);
        self.points.push_back(point);
        self.sum_x += point.x;
        self.sum_y += point.y;
        self.sum_xx += point.xx;
        self.sum_xy += point.xy;
        self.sum_yy += point.yy;

        let oldest_allowed = x - self.x_delta;
        let mut evicted = 0usize;
        while let Some(&oldest) = self.points.front() {
            if oldest.x >= oldest_allowed {
                break;
            }

            self.sum_x -= oldest.x;
            self.sum_y -= oldest.y;
            self.sum_xx -= oldest.xx;
            self.sum_xy -= oldest.xy;
            self.sum_yy -= oldest.yy;

            self.points.pop_front();
            evicted += 1;
        }

        if evicted > 0 {
            log::trace!("evicted {evicted} points, {} retained", self.points.len());
        }

        Ok(self)
    }

    /// Closed-form least-squares fit over the running sums
    fn compute_fit(&self) -> (T, T, T) {
        let n = T::from(self.points.len()).unwrap_or_else(T::nan);
        let _2 = T::one() + T::one();

        let sum_x = self.sum_x.total();
        let sum_y = self.sum_y.total();
        let sum_xx = self.sum_xx.total();
        let sum_xy = self.sum_xy.total();
        let sum_yy = self.sum_yy.total();

        let x_mean = sum_x / n;
        let slope = (sum_xy - x_mean * sum_y) / (sum_xx - x_mean * sum_x);
        let intercept = (sum_y - slope * sum_x) / n;

        // Sum of squared residuals expanded over the sums
        let residual = sum_yy - _2 * slope * sum_xy - _2 * intercept * sum_y
            + slope * slope * sum_xx
            + _2 * intercept * slope * sum_x
            + n * intercept * intercept;

        // Two points leave no degrees of freedom, the residual is only rounding noise
        let dof = n - _2;
        let std_error = if dof > T::zero() {
            (residual / dof).sqrt()
        } else {
            T::nan()
        };

        (slope, intercept, std_error)
    }

    /// Returns the slope, intercept and standard error of the best fit line
    ///
    /// The fit is cached until the next add, so repeated calls between adds
    /// return bit-identical values without recomputing.
    ///
    /// With an empty or single-point window every value is NaN. With two
    /// points the line is exact but the standard error is NaN, as it has
    /// `n - 2` degrees of freedom. When all retained x are equal the slope is
    /// NaN or infinite.
    ///
    /// # Returns
    ///
    /// * `(T, T, T)` - The slope, intercept and standard error
    ///
    /// # Examples
    ///
    /// ```
    /// use windowed_regression::WindowedRegression;
    /// use assert_approx_eq::assert_approx_eq;
    ///
    /// let mut reg = WindowedRegression::new(f64::INFINITY);
    /// for (x, y) in [(1.0, 1.0), (1.0, 2.0), (2.0, 3.0), (2.0, 4.0)] {
    ///     reg.add(x, y)?;
    /// }
    ///
    /// let (slope, intercept, std_error) = reg.calculate_with_std_error();
    /// assert_approx_eq!(slope, 2.0);
    /// assert_approx_eq!(intercept, -0.5);
    /// assert_approx_eq!(std_error, 0.7071, 1e-4);
    /// # Ok::<(), windowed_regression::RegressionError>(())
    /// ```
    pub fn calculate_with_std_error(&mut self) -> (T, T, T) {
        match self.fit {
            Some(fit) => fit,
            None => {
                let fit = self.compute_fit();
                self.fit = Some(fit);
                fit
            }
        }
    }

    /// Returns the slope and intercept of the best fit line
    ///
    /// Always equal to the first two values of
    /// [`calculate_with_std_error`](Self::calculate_with_std_error), served
    /// from the same cache.
    ///
    /// # Returns
    ///
    /// * `(T, T)` - The slope and intercept
    ///
    /// # Examples
    ///
    /// ```
    /// #![allow(deprecated)]
    /// use windowed_regression::WindowedRegression;
    ///
    /// let mut reg = WindowedRegression::<f64>::new(7.0);
    /// let (slope, intercept) = reg.calculate();
    /// assert!(slope.is_nan() && intercept.is_nan());
    /// ```
    #[deprecated(note = "use `calculate_with_std_error`")]
    pub fn calculate(&mut self) -> (T, T) {
        let (slope, intercept, _) = self.calculate_with_std_error();
        (slope, intercept)
    }

    /// Evaluates the best fit line at `x`
    ///
    /// # Arguments
    ///
    /// * `x` - The x to evaluate the line at
    ///
    /// # Returns
    ///
    /// * `T` - `slope * x + intercept`, NaN while the fit is undefined
    pub fn predict(&mut self, x: T) -> T {
        let (slope, intercept, _) = self.calculate_with_std_error();
        slope * x + intercept
    }
}
