//! A tiny built-in favicon (spec.md §4.6: "Tiny built-in icon"). A minimal
//! 1x1, 32bpp ICO, hand-assembled rather than pulled from a file so the
//! binary has no asset dependency.

#[rustfmt::skip]
pub const FAVICON_ICO: &[u8] = &[
    // ICONDIR: reserved, type=1 (icon), count=1
    0x00, 0x00, 0x01, 0x00, 0x01, 0x00,
    // ICONDIRENTRY: width=1, height=1, colors=0, reserved=0, planes=1,
    // bitcount=32, bytesInRes=48, imageOffset=22
    0x01, 0x01, 0x00, 0x00, 0x01, 0x00, 0x20, 0x00,
    0x30, 0x00, 0x00, 0x00, 0x16, 0x00, 0x00, 0x00,
    // BITMAPINFOHEADER (40 bytes)
    0x28, 0x00, 0x00, 0x00, // biSize
    0x01, 0x00, 0x00, 0x00, // biWidth
    0x02, 0x00, 0x00, 0x00, // biHeight (XOR+AND combined)
    0x01, 0x00,             // biPlanes
    0x20, 0x00,             // biBitCount
    0x00, 0x00, 0x00, 0x00, // biCompression
    0x08, 0x00, 0x00, 0x00, // biSizeImage
    0x00, 0x00, 0x00, 0x00, // biXPelsPerMeter
    0x00, 0x00, 0x00, 0x00, // biYPelsPerMeter
    0x00, 0x00, 0x00, 0x00, // biClrUsed
    0x00, 0x00, 0x00, 0x00, // biClrImportant
    // pixel data: one transparent BGRA pixel
    0x00, 0x00, 0x00, 0x00,
    // AND mask: one row, padded to 4 bytes
    0x00, 0x00, 0x00, 0x00,
];
