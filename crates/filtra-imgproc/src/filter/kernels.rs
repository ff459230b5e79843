use super::FilterError;

/// A square convolution kernel with row-major coefficients.
///
/// The size is always a positive odd integer so the kernel has a well-defined
/// center; the coefficients are immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    size: usize,
    coeffs: Vec<f32>,
}

impl Kernel {
    /// Create a new kernel from row-major coefficients.
    ///
    /// # Arguments
    ///
    /// * `size` - The side length of the kernel, a positive odd integer.
    /// * `coeffs` - The `size * size` coefficients in row-major order.
    ///
    /// # Errors
    ///
    /// Returns an error if the size is even or zero, or if the number of
    /// coefficients does not match the size.
    ///
    /// # Examples
    ///
    /// ```
    /// use filtra_imgproc::filter::kernels::Kernel;
    ///
    /// let kernel = Kernel::new(3, vec![0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0]).unwrap();
    /// assert_eq!(kernel.size(), 3);
    /// assert_eq!(kernel.half(), 1);
    /// ```
    pub fn new(size: usize, coeffs: Vec<f32>) -> Result<Self, FilterError> {
        if size == 0 || size % 2 == 0 {
            return Err(FilterError::InvalidKernelSize(size));
        }
        if coeffs.len() != size * size {
            return Err(FilterError::InvalidKernelLength(
                size,
                size * size,
                coeffs.len(),
            ));
        }
        Ok(Self { size, coeffs })
    }

    /// Get the side length of the kernel.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Get the half-width of the kernel window, `(size - 1) / 2`.
    pub fn half(&self) -> usize {
        (self.size - 1) / 2
    }

    /// Get the coefficients in row-major order.
    pub fn as_slice(&self) -> &[f32] {
        &self.coeffs
    }
}

/// Create the 3x3 identity kernel.
pub fn identity_kernel() -> Kernel {
    Kernel {
        size: 3,
        coeffs: vec![0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0],
    }
}

/// Create the 3x3 edge detection kernel.
pub fn edge_kernel() -> Kernel {
    Kernel {
        size: 3,
        coeffs: vec![-1.0, -1.0, -1.0, -1.0, 8.0, -1.0, -1.0, -1.0, -1.0],
    }
}

/// Create the 3x3 sharpen kernel.
pub fn sharpen_kernel() -> Kernel {
    Kernel {
        size: 3,
        coeffs: vec![0.0, -1.0, 0.0, -1.0, 5.0, -1.0, 0.0, -1.0, 0.0],
    }
}

/// Create the 3x3 box blur kernel.
pub fn blur_kernel() -> Kernel {
    Kernel {
        size: 3,
        coeffs: vec![1.0 / 9.0; 9],
    }
}

/// Create the 3x3 gaussian blur kernel.
pub fn gaussian_kernel() -> Kernel {
    Kernel {
        size: 3,
        coeffs: vec![
            1.0 / 16.0,
            2.0 / 16.0,
            1.0 / 16.0,
            2.0 / 16.0,
            4.0 / 16.0,
            2.0 / 16.0,
            1.0 / 16.0,
            2.0 / 16.0,
            1.0 / 16.0,
        ],
    }
}

/// Create the 3x3 emboss kernel.
pub fn emboss_kernel() -> Kernel {
    Kernel {
        size: 3,
        coeffs: vec![-2.0, -1.0, 0.0, -1.0, 1.0, 1.0, 0.0, 1.0, 2.0],
    }
}

/// An immutable mapping from filter name to kernel.
///
/// The registry is built once and never mutated, so lookups are pure and
/// safe to share across threads.
#[derive(Debug, Clone)]
pub struct KernelRegistry {
    entries: Vec<(&'static str, Kernel)>,
}

impl Default for KernelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl KernelRegistry {
    /// Create the registry with the built-in named kernels.
    pub fn new() -> Self {
        Self {
            entries: vec![
                ("edge", edge_kernel()),
                ("sharpen", sharpen_kernel()),
                ("blur", blur_kernel()),
                ("gaussian", gaussian_kernel()),
                ("emboss", emboss_kernel()),
                ("identity", identity_kernel()),
            ],
        }
    }

    /// Look up a kernel by name with a case-sensitive exact match.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::UnknownKernelName`] if the name is not present.
    pub fn get(&self, name: &str) -> Result<&Kernel, FilterError> {
        self.entries
            .iter()
            .find(|(entry_name, _)| *entry_name == name)
            .map(|(_, kernel)| kernel)
            .ok_or_else(|| FilterError::UnknownKernelName(name.to_string()))
    }

    /// The names of the registered kernels.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(name, _)| *name)
    }
}
