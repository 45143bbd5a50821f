mod c2d_tests;
