//! レコードファイルの読み書き
//!
//! ファイル先頭に u32（リトルエンディアン）のレコード数ヘッダを置く。
//! 書き込み時は仮の 0 を書いておき、閉じる直前に先頭へ戻って件数を書き込む。

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use super::error::{PipelineError, PipelineResult};
use super::record::{BoardRecord, Record};

/// レコードファイルの書き込み
///
/// `finish` せずに破棄した場合（途中でエラーになった場合を含む）は、書きかけのファイルを削除する。
pub struct RecordWriter<T: Record> {
    writer: Option<BufWriter<File>>,
    path: PathBuf,
    count: u64,
    finished: bool,
    _marker: PhantomData<T>,
}

/// ハッシュ順バッチファイルの書き込み
pub type BatchWriter = RecordWriter<BoardRecord>;

impl<T: Record> RecordWriter<T> {
    /// ファイルを作成してヘッダの場所を確保する
    pub fn create(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)?;
        let mut writer = Self {
            writer: Some(BufWriter::new(file)),
            path,
            count: 0,
            finished: false,
            _marker: PhantomData,
        };
        writer.inner()?.write_u32::<LittleEndian>(0)?;
        Ok(writer)
    }

    fn inner(&mut self) -> io::Result<&mut BufWriter<File>> {
        self.writer
            .as_mut()
            .ok_or_else(|| io::Error::other("record writer already closed"))
    }

    pub fn push(&mut self, record: &T) -> PipelineResult<()> {
        if self.count >= u32::MAX as u64 {
            return Err(PipelineError::TooManyRecords(self.count + 1));
        }
        record.write_to(self.inner()?)?;
        self.count += 1;
        Ok(())
    }

    /// これまでに書いたレコード数
    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// ヘッダに件数を書き込んで閉じる
    pub fn finish(mut self) -> PipelineResult<u64> {
        let writer = self
            .writer
            .take()
            .ok_or_else(|| io::Error::other("record writer already closed"))?;
        let mut file = writer.into_inner().map_err(|e| e.into_error())?;
        file.seek(SeekFrom::Start(0))?;
        file.write_u32::<LittleEndian>(self.count as u32)?;
        file.flush()?;
        self.finished = true;
        Ok(self.count)
    }
}

impl<T: Record> Drop for RecordWriter<T> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        drop(self.writer.take());
        if let Err(e) = std::fs::remove_file(&self.path) {
            log::warn!("failed to remove incomplete {}: {e}", self.path.display());
        }
    }
}

/// レコードファイルの逐次読み込み
///
/// ストリーム終端（レコード途中を含む）でデータ終わりとする。
/// 読めた件数がヘッダと食い違う場合は警告を出す。
pub struct RecordReader<R: Read, T: Record> {
    reader: R,
    header: u32,
    read: u64,
    finished: bool,
    _marker: PhantomData<T>,
}

impl<T: Record> RecordReader<BufReader<File>, T> {
    /// ファイルを開く
    pub fn open(path: impl AsRef<Path>) -> PipelineResult<Self> {
        Self::new(BufReader::new(File::open(path)?))
    }
}

impl<R: Read, T: Record> RecordReader<R, T> {
    /// ヘッダを読んでリーダーを作成（ヘッダがなければ 0 件扱い）
    pub fn new(mut reader: R) -> PipelineResult<Self> {
        let header = match reader.read_u32::<LittleEndian>() {
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => 0,
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            reader,
            header,
            read: 0,
            finished: false,
            _marker: PhantomData,
        })
    }

    /// ヘッダのレコード数
    pub fn header(&self) -> u32 {
        self.header
    }

    /// 次のレコード
    pub fn next_record(&mut self) -> PipelineResult<Option<T>> {
        if self.finished {
            return Ok(None);
        }
        match T::read_from(&mut self.reader)? {
            Some(record) => {
                self.read += 1;
                Ok(Some(record))
            }
            None => {
                self.finished = true;
                if self.read != self.header as u64 {
                    log::warn!(
                        "record count mismatch: header says {}, read {}",
                        self.header,
                        self.read
                    );
                }
                Ok(None)
            }
        }
    }
}

impl<R: Read, T: Record> Iterator for RecordReader<R, T> {
    type Item = PipelineResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

/// レコード列をファイルに書き出す
pub fn write_records<T: Record>(path: impl AsRef<Path>, records: &[T]) -> PipelineResult<u64> {
    let mut writer = RecordWriter::create(path)?;
    for record in records {
        writer.push(record)?;
    }
    writer.finish()
}

/// ハッシュ順バッチファイルを書き出す（records はハッシュ昇順であること）
pub fn write_batch(path: impl AsRef<Path>, records: &[BoardRecord]) -> PipelineResult<u64> {
    debug_assert!(records.windows(2).all(|w| w[0].hash <= w[1].hash));
    write_records(path, records)
}

/// ファイルの全レコードを読み込む
pub fn read_records<T: Record>(path: impl AsRef<Path>) -> PipelineResult<Vec<T>> {
    RecordReader::<_, T>::open(path)?.collect()
}
