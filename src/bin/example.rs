// Copyright 2019 int08h LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use eq_width_histogram::{EqWidthHistogram, HistogramEstimator, ValueType};

fn main() {
    let mut hist = EqWidthHistogram::new(5, ValueType::Int32);
    hist.initialize_buckets(0i32, 10i32); // Five buckets, each 10 wide

    // Raw column values, as a storage engine would hand them over
    for value in &[5i32, 15, 15, 25, 49, 49, 49] {
        hist.add_element(&value.to_le_bytes());
    }

    // Round trip through the persisted form
    let bytes = hist.serialize();
    println!("Serialized {} buckets into {} bytes", hist.num_buckets(), bytes.len());
    let hist = EqWidthHistogram::deserialize(&bytes).expect("freshly serialized histogram");

    println!(" start   count");
    for i in 0..hist.num_buckets() {
        println!(
            "{:6}  {:6}",
            hist.bucket_start_boundary::<i32>(i),
            hist.num_elements_in_bucket(i)
        );
    }

    let estimator = HistogramEstimator::new(hist.freeze());
    println!("x <= 25: {}", estimator.estimate_less_or_equal(25i32));
    println!("x <  25: {}", estimator.estimate_less(25i32));
    println!("x >= 25: {}", estimator.estimate_greater_or_equal(25i32));
    println!("x >  25: {}", estimator.estimate_greater(25i32));
    println!("x == 49: {}", estimator.estimate_equal(49i32));
    println!("total:   {}", estimator.num_elements());
}
