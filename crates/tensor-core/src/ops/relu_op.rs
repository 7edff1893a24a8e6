// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Rectified linear unit.

use crate::Tensor;

/// Clamps every element to `max(x, 0)` in place.
pub fn relu_inplace(tensor: &mut Tensor) {
    for x in tensor.as_mut_slice() {
        *x = x.max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Shape;

    #[test]
    fn test_relu_inplace() {
        let mut t = Tensor::from_f32(Shape::vector(3), &[-3.0, 3.0, -0.0]).unwrap();
        relu_inplace(&mut t);
        assert_eq!(t.as_slice(), &[0.0, 3.0, 0.0]);
    }
}
