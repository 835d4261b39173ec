//! `.npz`-backed [`OutputSink`]: buffers every snapshot in memory and
//! flushes them to one array file per rank when the run finishes. Living
//! here rather than in `miniweather` keeps the core crate free of any
//! concrete file format.

use std::fs::File;
use std::path::{Path, PathBuf};

use ndarray::{stack, Array1, Axis};
use ndarray_npy::NpzWriter;

use miniweather::{MiniWeatherError, OutputSink, OutputSnapshot};

/// Buffers snapshots for one rank; `finish` stacks them along a new leading
/// "step" axis and writes `{dens,uwnd,wwnd,theta,etime}.npy` into one `.npz`
/// archive per rank.
pub struct NpzSink {
    path: PathBuf,
    i_beg: usize,
    etimes: Vec<f64>,
    dens: Vec<ndarray::Array2<f64>>,
    uwnd: Vec<ndarray::Array2<f64>>,
    wwnd: Vec<ndarray::Array2<f64>>,
    theta: Vec<ndarray::Array2<f64>>,
}

impl NpzSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            i_beg: 0,
            etimes: Vec::new(),
            dens: Vec::new(),
            uwnd: Vec::new(),
            wwnd: Vec::new(),
            theta: Vec::new(),
        }
    }

    /// Where this rank's archive will be (or was) written.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stack every buffered snapshot and write the archive. Consumes `self`
    /// since there is nothing useful left to do with it afterward.
    pub fn finish(self) -> Result<(), MiniWeatherError> {
        if self.etimes.is_empty() {
            return Ok(());
        }
        let file = File::create(&self.path)?;
        let mut npz = NpzWriter::new(file);

        let etime = Array1::from_vec(self.etimes);
        npz.add_array("etime", &etime).map_err(npz_err)?;
        npz.add_array("i_beg", &Array1::from_elem(1, self.i_beg as i64)).map_err(npz_err)?;
        write_stacked(&mut npz, "dens", &self.dens)?;
        write_stacked(&mut npz, "uwnd", &self.uwnd)?;
        write_stacked(&mut npz, "wwnd", &self.wwnd)?;
        write_stacked(&mut npz, "theta", &self.theta)?;

        npz.finish().map_err(npz_err)?;
        Ok(())
    }
}

fn npz_err(e: impl std::fmt::Display) -> MiniWeatherError {
    MiniWeatherError::Output { message: e.to_string() }
}

fn write_stacked(npz: &mut NpzWriter<File>, name: &str, frames: &[ndarray::Array2<f64>]) -> Result<(), MiniWeatherError> {
    let views: Vec<_> = frames.iter().map(|a| a.view()).collect();
    let stacked = stack(Axis(0), &views).map_err(npz_err)?;
    npz.add_array(name, &stacked).map_err(npz_err)?;
    Ok(())
}

impl OutputSink for NpzSink {
    fn emit(&mut self, snapshot: &OutputSnapshot) -> Result<(), MiniWeatherError> {
        self.i_beg = snapshot.i_beg;
        self.etimes.push(snapshot.etime);
        self.dens.push(snapshot.dens.clone());
        self.uwnd.push(snapshot.uwnd.clone());
        self.wwnd.push(snapshot.wwnd.clone());
        self.theta.push(snapshot.theta.clone());
        Ok(())
    }
}
