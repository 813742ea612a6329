use bytes::{Buf, Bytes, BytesMut};

/// 分割されたバイト列の共通インターフェース
///
/// 論理的にはひとつの連続したバイト列を、物理的には複数の断片として保持する
/// バッファを表す。チェックサム計算は断片を順に読むだけで、内容を変更しない。
pub trait Segments {
    /// 断片を先頭から順に列挙
    fn segments(&self) -> impl Iterator<Item = &[u8]>;

    /// 全断片の合計長
    fn total_len(&self) -> usize {
        self.segments().map(<[u8]>::len).sum()
    }

    /// `offset` から `size` バイトを連続したバイト列としてコピー
    ///
    /// 範囲がバッファの長さを超える場合は存在するバイトまでに切り詰める。
    fn to_contiguous(&self, offset: usize, size: usize) -> Bytes {
        let mut out = BytesMut::with_capacity(size.min(self.total_len()));
        let mut skip = offset;
        let mut remaining = size;
        for segment in self.segments() {
            if remaining == 0 {
                break;
            }
            if skip >= segment.len() {
                skip -= segment.len();
                continue;
            }
            let segment = &segment[skip..];
            skip = 0;

            let take = segment.len().min(remaining);
            out.extend_from_slice(&segment[..take]);
            remaining -= take;
        }
        out.freeze()
    }
}

impl<T: AsRef<[u8]>> Segments for [T] {
    fn segments(&self) -> impl Iterator<Item = &[u8]> {
        self.iter().map(AsRef::<[u8]>::as_ref)
    }
}

impl<T: AsRef<[u8]>, const N: usize> Segments for [T; N] {
    fn segments(&self) -> impl Iterator<Item = &[u8]> {
        self.as_slice().segments()
    }
}

impl<T: AsRef<[u8]>> Segments for Vec<T> {
    fn segments(&self) -> impl Iterator<Item = &[u8]> {
        self.as_slice().segments()
    }
}

/// 複数の `Bytes` から成るバッファ
///
/// 断片の参照カウントを共有するだけで、バイト列そのものはコピーしない。
/// 長さ0の断片は保持しない。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentedBuffer {
    views: Vec<Bytes>,
    size: usize,
}

impl SegmentedBuffer {
    /// 断片の列からバッファを作成
    pub fn new(views: impl IntoIterator<Item = Bytes>) -> Self {
        let mut buffer = Self::default();
        for view in views {
            buffer.append(view);
        }
        buffer
    }

    /// 末尾に断片を追加
    pub fn append(&mut self, view: Bytes) {
        if view.is_empty() {
            return;
        }
        self.size += view.len();
        self.views.push(view);
    }

    /// バッファの長さ
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// 断片の一覧
    pub fn views(&self) -> &[Bytes] {
        &self.views
    }

    /// 先頭から `count` バイトを取り除く
    pub fn trim_front(&mut self, mut count: usize) {
        count = count.min(self.size);
        self.size -= count;
        while count > 0 {
            let first = &mut self.views[0];
            if count < first.len() {
                first.advance(count);
                break;
            }
            count -= first.len();
            self.views.remove(0);
        }
    }

    /// 長さを `length` バイトに制限する
    pub fn cap_length(&mut self, length: usize) {
        if length >= self.size {
            return;
        }
        self.size = length;

        let mut kept = 0;
        let mut end = 0;
        for view in &mut self.views {
            if kept + view.len() >= length {
                view.truncate(length - kept);
                end += 1;
                break;
            }
            kept += view.len();
            end += 1;
        }
        self.views.truncate(end);
        self.views.retain(|view| !view.is_empty());
    }

    /// 全体を連続したバイト列としてコピー
    pub fn to_bytes(&self) -> Bytes {
        match self.views.as_slice() {
            [] => Bytes::new(),
            [single] => single.clone(),
            _ => self.to_contiguous(0, self.size),
        }
    }
}

impl Segments for SegmentedBuffer {
    fn segments(&self) -> impl Iterator<Item = &[u8]> {
        self.views.iter().map(|view| &view[..])
    }

    fn total_len(&self) -> usize {
        self.size
    }
}

impl From<Bytes> for SegmentedBuffer {
    fn from(value: Bytes) -> Self {
        Self::new([value])
    }
}

impl From<Vec<u8>> for SegmentedBuffer {
    fn from(value: Vec<u8>) -> Self {
        Bytes::from(value).into()
    }
}
