// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

/// A closed interval `[lo, hi]` accumulated one value at a time.
///
/// The empty interval is represented as `[inf, -inf]` so that merging any
/// finite value into it produces a degenerate interval around that value.
/// NaN values never contribute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    lo: f64,
    hi: f64,
}

impl Interval {
    pub fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    pub fn empty() -> Self {
        Self {
            lo: f64::INFINITY,
            hi: f64::NEG_INFINITY,
        }
    }

    pub fn lo(&self) -> f64 {
        self.lo
    }

    pub fn hi(&self) -> f64 {
        self.hi
    }

    pub fn is_empty(&self) -> bool {
        self.lo > self.hi
    }

    pub fn update_value(&mut self, value: f64) {
        if value.is_nan() {
            return;
        }

        self.lo = self.lo.min(value);
        self.hi = self.hi.max(value);
    }
}

impl Default for Interval {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<(f64, f64)> for Interval {
    fn from(value: (f64, f64)) -> Self {
        Interval::new(value.0, value.1)
    }
}

impl From<(i32, i32)> for Interval {
    fn from(value: (i32, i32)) -> Self {
        Interval::new(value.0 as f64, value.1 as f64)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_empty() {
        let interval = Interval::empty();
        assert!(interval.is_empty());
        assert_eq!(Interval::default(), interval);
        assert!(!Interval::new(1.0, 1.0).is_empty());
    }

    #[test]
    fn test_update_value() {
        let mut interval = Interval::empty();
        interval.update_value(2.0);
        assert_eq!(interval, (2, 2).into());

        interval.update_value(-1.0);
        interval.update_value(f64::NAN);
        assert_eq!(interval, (-1.0, 2.0).into());
        assert_eq!(interval.lo(), -1.0);
        assert_eq!(interval.hi(), 2.0);
    }

    #[test]
    fn test_only_nan_stays_empty() {
        let mut interval = Interval::empty();
        interval.update_value(f64::NAN);
        assert!(interval.is_empty());
    }
}
